//! Confidence-only non-maximum suppression
//!
//! Used when no depth map is available for an image.

use crate::bbox::{self, PixelConvention};
use crate::error::SuppressionError;
use crate::traits::Suppressor;
use crate::Result;
use depthnms_core::CornerBox;
use serde::{Deserialize, Serialize};

/// Greedy NMS: visit boxes by descending confidence and drop every later
/// box whose IoU with a kept box exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlainNms {
    pub iou_threshold: f64,
    pub pixels: PixelConvention,
}

impl Default for PlainNms {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            pixels: PixelConvention::Continuous,
        }
    }
}

impl PlainNms {
    /// Create a suppressor with the given overlap threshold
    pub fn new(iou_threshold: f64, pixels: PixelConvention) -> Self {
        Self {
            iou_threshold,
            pixels,
        }
    }

    /// Keep mask in input order
    pub fn keep_mask(&self, boxes: &[CornerBox], confidence: &[f64]) -> Vec<bool> {
        // Stable sort, so equal confidences keep input order
        let mut order: Vec<usize> = (0..boxes.len()).collect();
        order.sort_by(|&a, &b| confidence[b].total_cmp(&confidence[a]));

        let mut keep = vec![false; boxes.len()];
        let mut suppressed = vec![false; boxes.len()];

        for (rank, &i) in order.iter().enumerate() {
            if suppressed[i] {
                continue;
            }
            keep[i] = true;

            for &j in &order[rank + 1..] {
                if !suppressed[j] && bbox::iou(&boxes[i], &boxes[j], self.pixels) > self.iou_threshold {
                    suppressed[j] = true;
                }
            }
        }

        keep
    }
}

impl Suppressor for PlainNms {
    fn suppress(&self, boxes: &[CornerBox], confidence: &[f64]) -> Result<Vec<bool>> {
        SuppressionError::check_lengths("boxes vs confidences", boxes.len(), confidence.len())?;
        Ok(self.keep_mask(boxes, confidence))
    }
}
