//! Depth maps stored as grayscale images

use crate::Result;
use anyhow::Context;
use depthnms_core::DepthMap;
use image::{DynamicImage, ImageBuffer, Luma};
use ndarray::Array2;
use std::path::Path;
use tracing::debug;

/// Converts grayscale pixels into depth with `depth = value * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthImageLoader {
    pub scale: f64,
    pub offset: f64,
}

impl Default for DepthImageLoader {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl DepthImageLoader {
    /// Create a loader with the given linear mapping
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    /// Load an 8- or 16-bit grayscale image as a depth map (height x width)
    ///
    /// 8-bit images keep their raw `0..=255` values; anything else is read
    /// through its 16-bit grayscale form.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<DepthMap> {
        let img = image::open(&path)
            .with_context(|| format!("Failed to open depth image: {:?}", path.as_ref()))?;

        debug!(
            "Loaded depth image {:?} ({}x{}, {:?})",
            path.as_ref(),
            img.width(),
            img.height(),
            img.color()
        );
        let map = match img {
            DynamicImage::ImageLuma8(buf) => self.from_luma8(&buf),
            other => self.from_luma16(&other.to_luma16()),
        };
        map.with_context(|| format!("Invalid depth image: {:?}", path.as_ref()))
    }

    /// Convert a 16-bit grayscale buffer
    pub fn from_luma16(&self, img: &ImageBuffer<Luma<u16>, Vec<u16>>) -> Result<DepthMap> {
        self.from_pixels(img.width(), img.height(), img.pixels().map(|p| p[0] as f64))
    }

    /// Convert an 8-bit grayscale buffer
    pub fn from_luma8(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<DepthMap> {
        self.from_pixels(img.width(), img.height(), img.pixels().map(|p| p[0] as f64))
    }

    fn from_pixels(&self, width: u32, height: u32, pixels: impl Iterator<Item = f64>) -> Result<DepthMap> {
        let values: Vec<f64> = pixels.map(|v| v * self.scale + self.offset).collect();
        let grid = Array2::from_shape_vec((height as usize, width as usize), values)
            .context("Depth image buffer does not match its dimensions")?;
        Ok(DepthMap::new(grid)?)
    }
}

/// Load a depth map from JSON nested rows (`[[d00, d01, ...], ...]`)
pub fn load_depth_json<P: AsRef<Path>>(path: P) -> Result<DepthMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read depth file: {:?}", path))?;
    let rows: Vec<Vec<f64>> =
        serde_json::from_str(&text).with_context(|| format!("Invalid depth JSON in {:?}", path))?;
    Ok(DepthMap::from_rows(&rows)?)
}
