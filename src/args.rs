use clap::Parser;

/// Filter detector anchors with depth-aware non-maximum suppression
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON anchors, shape [batch][anchors][5 + classes]
    #[arg(long, value_name = "FILE")]
    pub anchors: String,

    /// Label table: one label per line, or JSON (*.json)
    #[arg(long, value_name = "FILE")]
    pub labels: String,

    /// Depth map: grayscale image or JSON rows (*.json); plain NMS when absent
    #[arg(long, value_name = "FILE")]
    pub depth: Option<String>,

    /// Multiplier applied to depth image pixel values
    #[arg(long, default_value = "1.0", value_name = "SCALE")]
    pub depth_scale: f64,

    /// Offset added to depth image pixel values after scaling
    #[arg(long, default_value = "0.0", value_name = "OFFSET")]
    pub depth_offset: f64,

    /// JSON detection config
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Anchors are normalized to [0, 1] (ignored with --config)
    #[arg(long)]
    pub normalized: bool,

    /// Confidence threshold (overrides config)
    #[arg(long, value_name = "THRESHOLD")]
    pub confidence: Option<f64>,

    /// IoU threshold (overrides config)
    #[arg(long, value_name = "THRESHOLD")]
    pub iou: Option<f64>,

    /// Center-depth threshold (overrides config)
    #[arg(long, value_name = "THRESHOLD")]
    pub depth_threshold: Option<f64>,
}
