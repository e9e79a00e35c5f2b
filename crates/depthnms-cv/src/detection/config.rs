//! Detection configuration

use crate::bbox::PixelConvention;
use crate::suppression::{BoxFrame, SuppressionConfig};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main detection configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Anchors need a confidence strictly above this to be considered
    pub confidence_threshold: f64,
    pub suppression: SuppressionConfig,
    /// IoU convention of the confidence-only NMS used without a depth map
    pub fallback_pixels: PixelConvention,
    /// Dispatch images on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            suppression: SuppressionConfig::default(),
            fallback_pixels: PixelConvention::Continuous,
            parallel: false,
        }
    }
}

impl DetectionConfig {
    /// Inclusive-pixel IoU, single sweep, signed depth gate
    pub fn reference() -> Self {
        Self::default()
    }

    /// Configuration for boxes normalized to `[0, 1]`
    ///
    /// IoU drops the `+1` offset and boxes are scaled to the depth map's
    /// extent before depth lookups.
    pub fn normalized() -> Self {
        Self {
            suppression: SuppressionConfig {
                pixels: PixelConvention::Continuous,
                frame: BoxFrame::Normalized,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Override the confidence, IoU and depth thresholds
    pub fn with_thresholds(mut self, confidence: f64, iou: f64, depth: f64) -> Self {
        self.confidence_threshold = confidence;
        self.suppression.iou_threshold = iou;
        self.suppression.depth_threshold = depth;
        self
    }

    /// Load a JSON config; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config JSON in {:?}", path))?;
        config.suppression.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write config to: {:?}", path.as_ref()))?;
        Ok(())
    }
}
