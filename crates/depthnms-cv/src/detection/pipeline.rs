//! Per-image thresholding, suppression and labeling

use super::config::DetectionConfig;
use crate::suppression::DepthAwareSuppressor;
use crate::traits::Suppressor;
use crate::utils::PlainNms;
use crate::Result;
use anyhow::Context;
use depthnms_core::{AnchorBatch, CornerBox, DepthMap, Detection, LabelTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Candidate counts for one image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStats {
    pub candidates: usize,
    pub above_threshold: usize,
    pub kept: usize,
}

/// Filtered detections and labels, one entry per input image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub boxes: Vec<Vec<Detection>>,
    pub labels: Vec<Vec<String>>,
    pub stats: Vec<ImageStats>,
}

impl Extraction {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn total_kept(&self) -> usize {
        self.boxes.iter().map(Vec::len).sum()
    }
}

struct ImageResult {
    boxes: Vec<Detection>,
    labels: Vec<String>,
    stats: ImageStats,
}

/// Turns raw anchors into labeled, suppressed detections
pub struct DetectionPipeline<'a> {
    config: DetectionConfig,
    labels: &'a LabelTable,
}

impl<'a> DetectionPipeline<'a> {
    /// Create a pipeline, validating the suppression parameters
    pub fn new(config: DetectionConfig, labels: &'a LabelTable) -> Result<Self> {
        config.suppression.validate()?;
        Ok(Self { config, labels })
    }

    /// Active detection parameters
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Process every image of the batch.
    ///
    /// The depth map, when given, applies to every image; without one the
    /// confidence-only NMS is used.
    pub fn extract(&self, batch: &AnchorBatch, depth: Option<&DepthMap>) -> Result<Extraction> {
        let images = batch.images();
        let results = self.dispatch(images, depth)?;

        let mut extraction = Extraction::default();
        for result in results {
            extraction.boxes.push(result.boxes);
            extraction.labels.push(result.labels);
            extraction.stats.push(result.stats);
        }

        info!(
            "Extracted {} detections from {} image(s)",
            extraction.total_kept(),
            extraction.len()
        );
        Ok(extraction)
    }

    #[cfg(feature = "parallel")]
    fn dispatch(&self, images: &[Vec<Detection>], depth: Option<&DepthMap>) -> Result<Vec<ImageResult>> {
        use rayon::prelude::*;

        if self.config.parallel {
            return images
                .par_iter()
                .enumerate()
                .map(|(idx, anchors)| self.process_image(idx, anchors, depth))
                .collect();
        }
        self.dispatch_sequential(images, depth)
    }

    #[cfg(not(feature = "parallel"))]
    fn dispatch(&self, images: &[Vec<Detection>], depth: Option<&DepthMap>) -> Result<Vec<ImageResult>> {
        if self.config.parallel {
            warn!("Parallel dispatch requested but the `parallel` feature is disabled, running sequentially");
        }
        self.dispatch_sequential(images, depth)
    }

    fn dispatch_sequential(
        &self,
        images: &[Vec<Detection>],
        depth: Option<&DepthMap>,
    ) -> Result<Vec<ImageResult>> {
        images
            .iter()
            .enumerate()
            .map(|(idx, anchors)| self.process_image(idx, anchors, depth))
            .collect()
    }

    fn process_image(
        &self,
        idx: usize,
        anchors: &[Detection],
        depth: Option<&DepthMap>,
    ) -> Result<ImageResult> {
        let candidates: Vec<&Detection> = anchors
            .iter()
            .filter(|det| det.confidence > self.config.confidence_threshold)
            .collect();

        let boxes: Vec<CornerBox> = candidates.iter().map(|det| det.bbox.to_corners()).collect();
        let confidence: Vec<f64> = candidates.iter().map(|det| det.confidence).collect();

        let keep = match depth {
            Some(map) => DepthAwareSuppressor::new(self.config.suppression, map)?
                .suppress(&boxes, &confidence),
            None => PlainNms::new(self.config.suppression.iou_threshold, self.config.fallback_pixels)
                .suppress(&boxes, &confidence),
        }
        .with_context(|| format!("Suppression failed for image {}", idx))?;

        let kept: Vec<Detection> = candidates
            .into_iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(det, _)| det.clone())
            .collect();

        let labels = kept
            .iter()
            .map(|det| det.label(self.labels).map(str::to_string))
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Label lookup failed for image {}", idx))?;

        let stats = ImageStats {
            candidates: anchors.len(),
            above_threshold: boxes.len(),
            kept: kept.len(),
        };
        debug!(
            "Image {}: {} anchors, {} above threshold, {} kept ({})",
            idx,
            stats.candidates,
            stats.above_threshold,
            stats.kept,
            if depth.is_some() { "depth-aware" } else { "plain" }
        );

        Ok(ImageResult {
            boxes: kept,
            labels,
            stats,
        })
    }
}

/// One-shot convenience wrapper around [`DetectionPipeline`]
pub fn extract(
    batch: &AnchorBatch,
    config: DetectionConfig,
    labels: &LabelTable,
    depth: Option<&DepthMap>,
) -> Result<Extraction> {
    DetectionPipeline::new(config, labels)?.extract(batch, depth)
}
