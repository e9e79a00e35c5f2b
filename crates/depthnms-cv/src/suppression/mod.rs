//! Depth-aware non-maximum suppression
//!
//! Overlapping candidates at similar center depth are resolved by a combined
//! score `confidence + 1 / ln(mean depth over the box)`, which favors boxes
//! whose footprint sits closer to the camera.

pub mod depth;

pub use depth::DepthAwareSuppressor;

use crate::bbox::PixelConvention;
use crate::error::SuppressionError;
use depthnms_core::{CornerBox, DepthMap};
use serde::{Deserialize, Serialize};

/// Maps image `(x, y)` onto depth-map `(row, col)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthAxes {
    /// `depth[[y, x]]`, the layout of a height x width image
    #[default]
    RowMajor,
    /// `depth[[x, y]]`, for maps stored width-first
    Transposed,
}

impl DepthAxes {
    /// Depth-map `(row, col)` for image point `(x, y)`
    pub fn index(&self, x: i64, y: i64) -> (i64, i64) {
        match self {
            DepthAxes::RowMajor => (y, x),
            DepthAxes::Transposed => (x, y),
        }
    }
}

/// Coordinate frame of the boxes handed to the suppressor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxFrame {
    /// Boxes are already in depth-map pixels
    #[default]
    Pixels,
    /// Boxes are normalized to `[0, 1]` and get scaled to the map's extent
    /// (rounded to the nearest pixel) before any depth lookup
    Normalized,
}

impl BoxFrame {
    /// Bring a box into the depth map's pixel frame
    pub fn to_depth_frame(&self, b: &CornerBox, depth: &DepthMap, axes: DepthAxes) -> CornerBox {
        match self {
            BoxFrame::Pixels => *b,
            BoxFrame::Normalized => {
                let (rows, cols) = depth.dims();
                let (width, height) = match axes {
                    DepthAxes::RowMajor => (cols, rows),
                    DepthAxes::Transposed => (rows, cols),
                };
                b.to_pixels(
                    u32::try_from(width).unwrap_or(u32::MAX),
                    u32::try_from(height).unwrap_or(u32::MAX),
                )
            }
        }
    }
}

/// When a center-depth difference is small enough to resolve a pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthGate {
    /// `d_i - d_j < threshold`, evaluated in pair order `i < j`
    #[default]
    Signed,
    /// `|d_i - d_j| < threshold`
    Absolute,
}

impl DepthGate {
    /// Whether the pair `(i, j)` may be resolved by score
    pub fn fires(&self, d_i: f64, d_j: f64, threshold: f64) -> bool {
        match self {
            DepthGate::Signed => d_i - d_j < threshold,
            DepthGate::Absolute => (d_i - d_j).abs() < threshold,
        }
    }
}

/// Keeps `1 / ln(mean depth)` finite and positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoreGuard {
    /// Floor the mean depth at `min_depth` (must exceed 1)
    Clamp { min_depth: f64 },
    /// Fail when the mean depth is at most 1
    Require,
}

impl Default for ScoreGuard {
    fn default() -> Self {
        ScoreGuard::Clamp {
            min_depth: std::f64::consts::E,
        }
    }
}

/// Pair iteration strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepMode {
    /// One pass over every pair; suppressed boxes still compete with an
    /// effective confidence of zero
    #[default]
    Single,
    /// Skip pairs with a suppressed member and repeat passes until no
    /// decision changes
    UntilStable,
}

/// Depth-aware suppression parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    pub iou_threshold: f64,
    pub depth_threshold: f64,
    pub pixels: PixelConvention,
    pub frame: BoxFrame,
    pub axes: DepthAxes,
    pub gate: DepthGate,
    pub guard: ScoreGuard,
    pub sweep: SweepMode,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            depth_threshold: 0.1,
            pixels: PixelConvention::Inclusive,
            frame: BoxFrame::Pixels,
            axes: DepthAxes::RowMajor,
            gate: DepthGate::Signed,
            guard: ScoreGuard::default(),
            sweep: SweepMode::Single,
        }
    }
}

impl SuppressionConfig {
    /// Reject thresholds and guards that cannot produce a decision
    pub fn validate(&self) -> Result<(), SuppressionError> {
        if !self.iou_threshold.is_finite() {
            return Err(SuppressionError::InvalidConfig(format!(
                "iou_threshold must be finite, got {}",
                self.iou_threshold
            )));
        }
        if self.depth_threshold.is_nan() {
            return Err(SuppressionError::InvalidConfig(
                "depth_threshold must not be NaN".to_string(),
            ));
        }
        if let ScoreGuard::Clamp { min_depth } = self.guard {
            if !(min_depth > 1.0 && min_depth.is_finite()) {
                return Err(SuppressionError::InvalidConfig(format!(
                    "clamp min_depth must be finite and above 1, got {}",
                    min_depth
                )));
            }
        }
        Ok(())
    }
}

/// Final state of one candidate box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Kept,
    Suppressed,
    /// Kept, but overlapped another box whose depth did not allow a decision
    Unresolved,
}

/// Per-box decisions of a suppression run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuppressionOutcome {
    pub decisions: Vec<Decision>,
    pub sweeps: usize,
    pub pairs_compared: usize,
}

impl SuppressionOutcome {
    /// `true` for every box that was not suppressed, in input order
    pub fn keep_mask(&self) -> Vec<bool> {
        self.decisions
            .iter()
            .map(|d| *d != Decision::Suppressed)
            .collect()
    }

    pub fn kept_indices(&self) -> Vec<usize> {
        self.decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| **d != Decision::Suppressed)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn suppressed_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| **d == Decision::Suppressed)
            .count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| **d == Decision::Unresolved)
            .count()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_direction() {
        // Box i much closer than box j: signed gate fires, absolute does not
        assert!(DepthGate::Signed.fires(1.0, 5.0, 0.1));
        assert!(!DepthGate::Absolute.fires(1.0, 5.0, 0.1));
        // Box i much farther: neither fires
        assert!(!DepthGate::Signed.fires(5.0, 1.0, 0.1));
        assert!(DepthGate::Absolute.fires(5.0, 5.05, 0.1));
    }

    #[test]
    fn test_axes() {
        assert_eq!(DepthAxes::RowMajor.index(3, 7), (7, 3));
        assert_eq!(DepthAxes::Transposed.index(3, 7), (3, 7));
    }

    #[test]
    fn test_normalized_frame_scales_to_map() {
        let depth = DepthMap::new(ndarray::Array2::from_elem((50, 200), 3.0)).unwrap();
        let b = CornerBox::new(0.1, 0.2, 0.5, 0.6);

        assert_eq!(BoxFrame::Pixels.to_depth_frame(&b, &depth, DepthAxes::RowMajor), b);
        assert_eq!(
            BoxFrame::Normalized.to_depth_frame(&b, &depth, DepthAxes::RowMajor),
            CornerBox::new(20.0, 10.0, 100.0, 30.0)
        );
        // Width-first maps carry x along the rows
        assert_eq!(
            BoxFrame::Normalized.to_depth_frame(&b, &depth, DepthAxes::Transposed),
            CornerBox::new(5.0, 40.0, 25.0, 120.0)
        );
    }

    #[test]
    fn test_validate() {
        assert!(SuppressionConfig::default().validate().is_ok());
        let bad = SuppressionConfig {
            guard: ScoreGuard::Clamp { min_depth: 1.0 },
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(SuppressionError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_json() {
        let cfg: SuppressionConfig = serde_json::from_str(
            r#"{"iou_threshold": 0.3, "sweep": "UntilStable", "guard": "Require"}"#,
        )
        .unwrap();
        assert_eq!(cfg.iou_threshold, 0.3);
        assert_eq!(cfg.sweep, SweepMode::UntilStable);
        assert_eq!(cfg.guard, ScoreGuard::Require);
        assert_eq!(cfg.depth_threshold, 0.1);
    }

    #[test]
    fn test_outcome_mask() {
        let outcome = SuppressionOutcome {
            decisions: vec![Decision::Kept, Decision::Suppressed, Decision::Unresolved],
            ..Default::default()
        };
        assert_eq!(outcome.keep_mask(), vec![true, false, true]);
        assert_eq!(outcome.kept_indices(), vec![0, 2]);
        assert_eq!(outcome.suppressed_count(), 1);
        assert_eq!(outcome.unresolved_count(), 1);
    }
}
