//! Anchor-to-detection pipeline

pub mod config;
pub mod pipeline;

pub use config::DetectionConfig;
pub use pipeline::{DetectionPipeline, Extraction, ImageStats, extract};
