//! Greedy pairwise suppression driven by depth statistics

use super::{Decision, ScoreGuard, SuppressionConfig, SuppressionOutcome, SweepMode};
use crate::bbox;
use crate::error::SuppressionError;
use crate::traits::Suppressor;
use crate::Result;
use anyhow::Context;
use depthnms_core::{CornerBox, DepthError, DepthMap};
use tracing::{debug, trace, warn};

/// Depth-aware suppressor bound to one image's depth map
#[derive(Debug, Clone, Copy)]
pub struct DepthAwareSuppressor<'a> {
    config: SuppressionConfig,
    depth: &'a DepthMap,
}

/// Lazily computed per-box depth statistics
#[derive(Debug, Clone, Copy, Default)]
struct DepthCache {
    center: Option<f64>,
    term: Option<f64>,
}

impl<'a> DepthAwareSuppressor<'a> {
    /// Bind a validated config to a depth map
    pub fn new(config: SuppressionConfig, depth: &'a DepthMap) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, depth })
    }

    /// Active suppression parameters
    pub fn config(&self) -> &SuppressionConfig {
        &self.config
    }

    /// Depth at the truncated midpoint of a box
    pub fn center_depth(&self, b: &CornerBox) -> std::result::Result<f64, DepthError> {
        let b = self.in_depth_frame(b);
        let x = ((b.x1 + b.x2) / 2.0).floor() as i64;
        let y = ((b.y1 + b.y2) / 2.0).floor() as i64;
        let (row, col) = self.config.axes.index(x, y);
        self.depth.at(row, col)
    }

    /// Mean depth over the region spanned by the box's own corners
    pub fn region_depth(&self, b: &CornerBox) -> std::result::Result<f64, DepthError> {
        let b = self.in_depth_frame(b);
        let xs = b.x1.floor() as i64..b.x2.floor() as i64;
        let ys = b.y1.floor() as i64..b.y2.floor() as i64;
        match self.config.axes {
            super::DepthAxes::RowMajor => self.depth.region_mean(ys, xs),
            super::DepthAxes::Transposed => self.depth.region_mean(xs, ys),
        }
    }

    fn in_depth_frame(&self, b: &CornerBox) -> CornerBox {
        self.config.frame.to_depth_frame(b, self.depth, self.config.axes)
    }

    /// `1 / ln(mean region depth)` under the configured guard
    pub fn depth_term(&self, b: &CornerBox) -> std::result::Result<f64, DepthError> {
        let mean = self.region_depth(b)?;
        let mean = match self.config.guard {
            ScoreGuard::Clamp { min_depth } => {
                if mean < min_depth {
                    warn!("Mean depth {:.4} below {:.4}, clamping before log", mean, min_depth);
                }
                mean.max(min_depth)
            }
            ScoreGuard::Require => {
                if mean <= 1.0 {
                    return Err(DepthError::UndefinedScore { mean });
                }
                mean
            }
        };
        Ok(1.0 / mean.ln())
    }

    /// Run the pairwise sweep(s) and report a decision per box
    pub fn run(&self, boxes: &[CornerBox], confidence: &[f64]) -> Result<SuppressionOutcome> {
        SuppressionError::check_lengths("boxes vs confidences", boxes.len(), confidence.len())?;
        if boxes.is_empty() {
            return Ok(SuppressionOutcome::default());
        }
        if let Some(idx) = boxes
            .iter()
            .position(|b| !b.as_array().iter().all(|v| v.is_finite()))
        {
            return Err(SuppressionError::NonFiniteBox(idx).into());
        }

        let n = boxes.len();
        let mut suppressed = vec![false; n];
        let mut unresolved = vec![false; n];
        let mut cache = vec![DepthCache::default(); n];
        let mut sweeps = 0;
        let mut pairs_compared = 0;

        loop {
            sweeps += 1;
            let mut changed = false;

            for i in 0..n {
                for j in (i + 1)..n {
                    if self.config.sweep == SweepMode::UntilStable && (suppressed[i] || suppressed[j]) {
                        continue;
                    }
                    pairs_compared += 1;

                    let overlap = bbox::iou(&boxes[i], &boxes[j], self.config.pixels);
                    if overlap <= self.config.iou_threshold {
                        continue;
                    }

                    let d_i = self.cached_center(&mut cache, boxes, i)?;
                    let d_j = self.cached_center(&mut cache, boxes, j)?;
                    if !self.config.gate.fires(d_i, d_j, self.config.depth_threshold) {
                        trace!("pair ({}, {}) iou {:.3}: depths {:.3} / {:.3} left unresolved", i, j, overlap, d_i, d_j);
                        unresolved[i] = true;
                        unresolved[j] = true;
                        continue;
                    }

                    // Suppressed boxes compete with zero confidence
                    let c_i = if suppressed[i] { 0.0 } else { confidence[i] };
                    let c_j = if suppressed[j] { 0.0 } else { confidence[j] };
                    let s_i = c_i + self.cached_term(&mut cache, boxes, i)?;
                    let s_j = c_j + self.cached_term(&mut cache, boxes, j)?;

                    let loser = if s_i > s_j { j } else { i };
                    trace!("pair ({}, {}) iou {:.3}: scores {:.4} / {:.4}, suppress {}", i, j, overlap, s_i, s_j, loser);
                    if !suppressed[loser] {
                        suppressed[loser] = true;
                        changed = true;
                    }
                }
            }

            // Suppression only grows, so this terminates within n passes
            if self.config.sweep == SweepMode::Single || !changed {
                break;
            }
        }

        let decisions: Vec<Decision> = suppressed
            .iter()
            .zip(&unresolved)
            .map(|(&s, &u)| match (s, u) {
                (true, _) => Decision::Suppressed,
                (false, true) => Decision::Unresolved,
                (false, false) => Decision::Kept,
            })
            .collect();

        let outcome = SuppressionOutcome {
            decisions,
            sweeps,
            pairs_compared,
        };
        debug!(
            "Depth-aware NMS: {} boxes, {} suppressed, {} unresolved, {} sweep(s)",
            n,
            outcome.suppressed_count(),
            outcome.unresolved_count(),
            sweeps
        );
        Ok(outcome)
    }

    fn cached_center(&self, cache: &mut [DepthCache], boxes: &[CornerBox], k: usize) -> Result<f64> {
        if let Some(d) = cache[k].center {
            return Ok(d);
        }
        let d = self
            .center_depth(&boxes[k])
            .with_context(|| format!("Center depth of box {} {:?}", k, boxes[k]))?;
        cache[k].center = Some(d);
        Ok(d)
    }

    fn cached_term(&self, cache: &mut [DepthCache], boxes: &[CornerBox], k: usize) -> Result<f64> {
        if let Some(t) = cache[k].term {
            return Ok(t);
        }
        let t = self
            .depth_term(&boxes[k])
            .with_context(|| format!("Region depth of box {} {:?}", k, boxes[k]))?;
        cache[k].term = Some(t);
        Ok(t)
    }
}

impl Suppressor for DepthAwareSuppressor<'_> {
    fn suppress(&self, boxes: &[CornerBox], confidence: &[f64]) -> Result<Vec<bool>> {
        Ok(self.run(boxes, confidence)?.keep_mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suppression::{BoxFrame, DepthAxes, DepthGate};
    use ndarray::Array2;

    fn map(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> DepthMap {
        DepthMap::new(Array2::from_shape_fn((rows, cols), |(r, c)| f(r, c))).unwrap()
    }

    fn config() -> SuppressionConfig {
        SuppressionConfig::default()
    }

    #[test]
    fn test_empty_and_single() -> Result<()> {
        let depth = map(4, 4, |_, _| 5.0);
        let nms = DepthAwareSuppressor::new(config(), &depth)?;

        assert!(nms.suppress(&[], &[])?.is_empty());
        assert_eq!(nms.suppress(&[CornerBox::new(0.0, 0.0, 3.0, 3.0)], &[0.1])?, vec![true]);
        Ok(())
    }

    #[test]
    fn test_non_overlapping_both_kept() -> Result<()> {
        let depth = map(70, 70, |_, _| 5.0);
        let nms = DepthAwareSuppressor::new(config(), &depth)?;
        let boxes = [
            CornerBox::new(0.0, 0.0, 10.0, 10.0),
            CornerBox::new(50.0, 50.0, 60.0, 60.0),
        ];
        assert_eq!(nms.suppress(&boxes, &[0.9, 0.8])?, vec![true, true]);
        Ok(())
    }

    #[test]
    fn test_depth_overrides_confidence() -> Result<()> {
        // Rows 0..11 are near, everything below is far
        let depth = map(20, 20, |r, _| if r < 11 { 3.0 } else { 1000.0 });
        let nms = DepthAwareSuppressor::new(config(), &depth)?;
        let boxes = [
            CornerBox::new(0.0, 0.0, 10.0, 10.0),
            CornerBox::new(0.0, 0.0, 10.0, 14.0),
        ];

        // Same center depth; the first box sits entirely over near depth
        assert_eq!(nms.center_depth(&boxes[0])?, nms.center_depth(&boxes[1])?);
        let s0 = 0.6 + nms.depth_term(&boxes[0])?;
        let s1 = 0.9 + nms.depth_term(&boxes[1])?;
        assert!(s0 > s1);

        let outcome = nms.run(&boxes, &[0.6, 0.9])?;
        assert_eq!(outcome.decisions, vec![Decision::Kept, Decision::Suppressed]);
        Ok(())
    }

    #[test]
    fn test_equal_scores_suppress_first() -> Result<()> {
        let depth = map(20, 20, |_, _| 10.0);
        let nms = DepthAwareSuppressor::new(config(), &depth)?;
        let b = CornerBox::new(2.0, 2.0, 12.0, 12.0);
        assert_eq!(nms.suppress(&[b, b], &[0.5, 0.5])?, vec![false, true]);
        Ok(())
    }

    #[test]
    fn test_zero_confidence_is_not_suppressed() -> Result<()> {
        let depth = map(20, 20, |_, c| if c < 12 { 3.0 } else { 500.0 });
        let nms = DepthAwareSuppressor::new(config(), &depth)?;
        let boxes = [
            CornerBox::new(0.0, 0.0, 10.0, 10.0),
            CornerBox::new(1.0, 0.0, 15.0, 10.0),
        ];
        // The zero-confidence box wins on depth and stays kept
        let outcome = nms.run(&boxes, &[0.0, 0.2])?;
        assert_eq!(outcome.keep_mask(), vec![true, false]);
        Ok(())
    }

    #[test]
    fn test_far_first_box_left_unresolved() -> Result<()> {
        // Box 0 centers over far depth, box 1 over near depth
        let depth = map(20, 30, |_, c| if c < 8 { 4.0 } else { 40.0 });
        let nms = DepthAwareSuppressor::new(config(), &depth)?;
        let boxes = [
            CornerBox::new(4.0, 0.0, 14.0, 10.0),
            CornerBox::new(2.0, 0.0, 12.0, 10.0),
        ];
        let outcome = nms.run(&boxes, &[0.9, 0.8])?;
        assert_eq!(outcome.decisions, vec![Decision::Unresolved, Decision::Unresolved]);
        assert_eq!(outcome.keep_mask(), vec![true, true]);

        let absolute = SuppressionConfig {
            gate: DepthGate::Absolute,
            ..config()
        };
        let nms = DepthAwareSuppressor::new(absolute, &depth)?;
        assert_eq!(nms.run(&boxes, &[0.9, 0.8])?.unresolved_count(), 2);
        Ok(())
    }

    #[test]
    fn test_single_sweep_lets_suppressed_box_compete() -> Result<()> {
        // A (middle) overlaps B (left) and C (right); B and C barely touch
        let depth = map(12, 24, |_, c| if c < 16 { 3.0 } else { 1000.0 });
        let boxes = [
            CornerBox::new(5.0, 0.0, 15.0, 10.0),
            CornerBox::new(0.0, 0.0, 10.0, 10.0),
            CornerBox::new(10.0, 0.0, 20.0, 10.0),
        ];
        let confidence = [0.3, 0.95, 0.5];
        let base = SuppressionConfig {
            iou_threshold: 0.3,
            ..config()
        };

        let single = DepthAwareSuppressor::new(base, &depth)?.run(&boxes, &confidence)?;
        assert_eq!(single.keep_mask(), vec![false, true, false]);
        assert_eq!(single.sweeps, 1);
        assert_eq!(single.pairs_compared, 3);

        let stable = SuppressionConfig {
            sweep: SweepMode::UntilStable,
            ..base
        };
        let stable = DepthAwareSuppressor::new(stable, &depth)?.run(&boxes, &confidence)?;
        assert_eq!(stable.keep_mask(), vec![false, true, true]);
        assert_eq!(stable.sweeps, 2);
        Ok(())
    }

    #[test]
    fn test_axis_convention_on_gradient() -> Result<()> {
        // Depth grows with the column index only
        let depth = map(16, 16, |_, c| 10.0 + c as f64);
        let b = CornerBox::new(6.0, 1.0, 8.0, 3.0); // center x = 7, y = 2

        let row_major = DepthAwareSuppressor::new(config(), &depth)?;
        assert_eq!(row_major.center_depth(&b)?, 17.0);

        let transposed = SuppressionConfig {
            axes: DepthAxes::Transposed,
            ..config()
        };
        let transposed = DepthAwareSuppressor::new(transposed, &depth)?;
        assert_eq!(transposed.center_depth(&b)?, 12.0);

        // Region mean over cols 6..8 vs rows 6..8 / cols 1..3
        assert_eq!(row_major.region_depth(&b)?, 16.5);
        assert_eq!(transposed.region_depth(&b)?, 11.5);
        Ok(())
    }

    #[test]
    fn test_normalized_boxes_read_scaled_depth() -> Result<()> {
        let depth = map(100, 100, |_, c| 2.0 + c as f64);
        let left = CornerBox::new(0.05, 0.4, 0.15, 0.6);
        let right = CornerBox::new(0.85, 0.4, 0.95, 0.6);

        let normalized = SuppressionConfig {
            frame: BoxFrame::Normalized,
            ..config()
        };
        let nms = DepthAwareSuppressor::new(normalized, &depth)?;
        assert_eq!(nms.center_depth(&left)?, 12.0);
        assert_eq!(nms.center_depth(&right)?, 92.0);
        assert_eq!(nms.region_depth(&left)?, 11.5);
        assert_eq!(nms.region_depth(&right)?, 91.5);

        // Read as pixels, both boxes collapse onto the first cell
        let raw = DepthAwareSuppressor::new(config(), &depth)?;
        assert_eq!(raw.center_depth(&left)?, raw.center_depth(&right)?);
        Ok(())
    }

    #[test]
    fn test_out_of_bounds_is_an_error() -> Result<()> {
        let depth = map(8, 8, |_, _| 5.0);
        let nms = DepthAwareSuppressor::new(config(), &depth)?;
        let boxes = [
            CornerBox::new(4.0, 4.0, 20.0, 20.0),
            CornerBox::new(5.0, 5.0, 20.0, 20.0),
        ];
        let err = nms.run(&boxes, &[0.9, 0.8]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DepthError>(),
            Some(DepthError::OutOfBounds { .. })
        ));

        // Disjoint boxes never touch the depth map
        let apart = [
            CornerBox::new(100.0, 100.0, 110.0, 110.0),
            CornerBox::new(200.0, 200.0, 210.0, 210.0),
        ];
        assert_eq!(nms.suppress(&apart, &[0.9, 0.8])?, vec![true, true]);
        Ok(())
    }

    #[test]
    fn test_score_guards() -> Result<()> {
        let shallow = map(10, 10, |_, _| 0.5);
        let boxes = [CornerBox::new(0.0, 0.0, 8.0, 8.0), CornerBox::new(1.0, 1.0, 8.0, 8.0)];

        // Clamped: both terms equal 1 / ln(e) = 1
        let clamp = DepthAwareSuppressor::new(config(), &shallow)?;
        assert!((clamp.depth_term(&boxes[0])? - 1.0).abs() < 1e-12);
        assert_eq!(clamp.suppress(&boxes, &[0.9, 0.4])?, vec![true, false]);

        let require = SuppressionConfig {
            guard: ScoreGuard::Require,
            ..config()
        };
        let require = DepthAwareSuppressor::new(require, &shallow)?;
        let err = require.run(&boxes, &[0.9, 0.4]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DepthError>(),
            Some(DepthError::UndefinedScore { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_bad_input() {
        let depth = map(4, 4, |_, _| 5.0);
        let nms = DepthAwareSuppressor::new(config(), &depth).unwrap();
        assert!(nms.run(&[CornerBox::default()], &[]).is_err());
        let err = nms
            .run(&[CornerBox::new(f64::NAN, 0.0, 1.0, 1.0)], &[0.5])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SuppressionError>(),
            Some(&SuppressionError::NonFiniteBox(0))
        );
    }
}
