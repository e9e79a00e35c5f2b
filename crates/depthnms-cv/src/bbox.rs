//! Intersection-over-union for corner-form boxes
//!
//! Boxes given in pixel coordinates are treated as inclusive index ranges,
//! so a box spanning `0..=9` covers ten pixels. Boxes normalized to `[0, 1]`
//! should use [`PixelConvention::Continuous`].

use crate::error::SuppressionError;
use depthnms_core::{CenterBox, CornerBox};
use serde::{Deserialize, Serialize};

/// Guards the union against degenerate (zero-area) box pairs
pub const UNION_EPSILON: f64 = 1e-16;

/// How box extents are measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelConvention {
    /// Coordinates are inclusive pixel indices; extents get a `+1`
    #[default]
    Inclusive,
    /// Coordinates are continuous (e.g. normalized); no offset
    Continuous,
}

impl PixelConvention {
    /// Extent added to every side length
    pub fn offset(&self) -> f64 {
        match self {
            PixelConvention::Inclusive => 1.0,
            PixelConvention::Continuous => 0.0,
        }
    }

    /// Area of a single box under this convention
    pub fn area(&self, b: &CornerBox) -> f64 {
        let off = self.offset();
        (b.x2 - b.x1 + off) * (b.y2 - b.y1 + off)
    }
}

/// Raw intersection and union areas of a box pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub intersection: f64,
    /// Includes [`UNION_EPSILON`]
    pub union: f64,
}

impl Overlap {
    /// Intersection over union
    pub fn iou(&self) -> f64 {
        self.intersection / self.union
    }

    /// Fraction of `area` covered by the intersection, for containment tests
    pub fn coverage_of(&self, area: f64) -> f64 {
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection / area
    }
}

/// Intersection and union areas of two boxes
pub fn areas(a: &CornerBox, b: &CornerBox, pixels: PixelConvention) -> Overlap {
    let off = pixels.offset();
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    let intersection = (ix2 - ix1 + off).max(0.0) * (iy2 - iy1 + off).max(0.0);
    let union = pixels.area(a) + pixels.area(b) - intersection + UNION_EPSILON;

    Overlap {
        intersection,
        union,
    }
}

/// Intersection over union of two boxes
pub fn iou(a: &CornerBox, b: &CornerBox, pixels: PixelConvention) -> f64 {
    areas(a, b, pixels).iou()
}

/// Intersection over union of two center-form `(cx, cy, w, h)` boxes
pub fn iou_center(a: &CenterBox, b: &CenterBox, pixels: PixelConvention) -> f64 {
    iou(&a.to_corners(), &b.to_corners(), pixels)
}

/// Elementwise IoU of two equally long box lists
pub fn iou_batch(
    a: &[CornerBox],
    b: &[CornerBox],
    pixels: PixelConvention,
) -> Result<Vec<f64>, SuppressionError> {
    SuppressionError::check_lengths("iou batch", a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(a, b)| iou(a, b, pixels)).collect())
}

/// Elementwise intersection and union areas of two equally long box lists
pub fn areas_batch(
    a: &[CornerBox],
    b: &[CornerBox],
    pixels: PixelConvention,
) -> Result<Vec<Overlap>, SuppressionError> {
    SuppressionError::check_lengths("area batch", a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(a, b)| areas(a, b, pixels)).collect())
}
