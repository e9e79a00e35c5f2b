mod args;
mod parser;

use anyhow::{Context, Result};
use clap::Parser;
use depthnms_cv::{DetectionConfig, DetectionPipeline};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = args::Args::parse();

    let mut config = match &args.config {
        Some(path) => DetectionConfig::load(path)?,
        None if args.normalized => DetectionConfig::normalized(),
        None => DetectionConfig::default(),
    };
    if let Some(confidence) = args.confidence {
        config.confidence_threshold = confidence;
    }
    if let Some(iou) = args.iou {
        config.suppression.iou_threshold = iou;
    }
    if let Some(depth_threshold) = args.depth_threshold {
        config.suppression.depth_threshold = depth_threshold;
    }

    let batch = parser::load_anchors(&args.anchors)?;
    let labels = parser::load_labels(&args.labels)?;
    let depth = parser::load_depth(&args)?;

    info!(
        "Loaded {} image(s), {} labels, depth map: {}",
        batch.len(),
        labels.len(),
        depth
            .as_ref()
            .map(|d| format!("{}x{}", d.dims().0, d.dims().1))
            .unwrap_or_else(|| "none".to_string())
    );

    let pipeline = DetectionPipeline::new(config, &labels)?;
    let extraction = pipeline.extract(&batch, depth.as_ref())?;

    let json = serde_json::to_string_pretty(&extraction).context("Failed to serialize detection results")?;
    println!("{}", json);
    Ok(())
}
