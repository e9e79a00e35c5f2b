//! Box encodings and format conversion
//!
//! Detectors emit boxes in center form `(cx, cy, w, h)`; the suppression
//! algorithms work on corner form `(x1, y1, x2, y2)`.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Box given by its center point and size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Box given by its top-left and bottom-right corners
///
/// Nothing enforces `x2 >= x1` or `y2 >= y1`; inverted boxes simply have no
/// overlap with anything.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CenterBox {
    /// Create a new center-form box
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    /// Convert to corner form
    pub fn to_corners(&self) -> CornerBox {
        CornerBox {
            x1: self.cx - self.w / 2.0,
            y1: self.cy - self.h / 2.0,
            x2: self.cx + self.w / 2.0,
            y2: self.cy + self.h / 2.0,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.cx, self.cy, self.w, self.h]
    }
}

impl CornerBox {
    /// Create a new corner-form box
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Convert to center form
    pub fn to_center(&self) -> CenterBox {
        CenterBox {
            cx: (self.x1 + self.x2) / 2.0,
            cy: (self.y1 + self.y2) / 2.0,
            w: self.x2 - self.x1,
            h: self.y2 - self.y1,
        }
    }

    /// Horizontal extent, without any pixel offset
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Vertical extent, without any pixel offset
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Scale a box normalized to `[0, 1]` into pixel space, rounding each
    /// coordinate to the nearest pixel.
    pub fn to_pixels(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            x1: (self.x1 * w).round(),
            y1: (self.y1 * h).round(),
            x2: (self.x2 * w).round(),
            y2: (self.y2 * h).round(),
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<CenterBox> for CornerBox {
    fn from(b: CenterBox) -> Self {
        b.to_corners()
    }
}

impl From<CornerBox> for CenterBox {
    fn from(b: CornerBox) -> Self {
        b.to_center()
    }
}

impl From<[f64; 4]> for CornerBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<[f64; 4]> for CenterBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Convert an `N x 4` array of center-form rows into corner form.
///
/// Columns past the fourth are ignored.
pub fn xywh2xyxy(x: ArrayView2<f64>) -> Array2<f64> {
    let mut y = Array2::zeros((x.nrows(), 4));
    for (src, mut dst) in x.axis_iter(Axis(0)).zip(y.axis_iter_mut(Axis(0))) {
        let c = CenterBox::new(src[0], src[1], src[2], src[3]).to_corners();
        dst.assign(&ndarray::arr1(&c.as_array()));
    }
    y
}

/// Convert an `N x 4` array of corner-form rows into center form.
pub fn xyxy2xywh(x: ArrayView2<f64>) -> Array2<f64> {
    let mut y = Array2::zeros((x.nrows(), 4));
    for (src, mut dst) in x.axis_iter(Axis(0)).zip(y.axis_iter_mut(Axis(0))) {
        let c = CornerBox::new(src[0], src[1], src[2], src[3]).to_center();
        dst.assign(&ndarray::arr1(&c.as_array()));
    }
    y
}
