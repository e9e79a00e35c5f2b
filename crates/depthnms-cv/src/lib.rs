//! Depth-aware detection filtering
//!
//! IoU evaluation, plain and depth-aware non-maximum suppression, and the
//! anchor-to-detection pipeline that ties them to a label table.

pub mod bbox;
pub mod detection;
pub mod error;
pub mod suppression;
pub mod utils;

// Re-export commonly used types
pub use bbox::{Overlap, PixelConvention, iou_center};
pub use detection::{DetectionConfig, DetectionPipeline, Extraction, ImageStats, extract};
pub use error::SuppressionError;
pub use suppression::{BoxFrame, DepthAwareSuppressor, Decision, SuppressionConfig, SuppressionOutcome};
pub use utils::PlainNms;

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the suppression system
pub mod traits {
    use super::*;
    use depthnms_core::CornerBox;

    /// Trait for non-maximum suppression implementations
    ///
    /// Returns one keep flag per input box, in input order.
    pub trait Suppressor {
        fn suppress(&self, boxes: &[CornerBox], confidence: &[f64]) -> Result<Vec<bool>>;
    }
}
