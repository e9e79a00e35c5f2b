//! Depth-aware detection data model
//!
//! Box encodings, depth maps, label tables and raw detector anchors shared by
//! the suppression algorithms in `depthnms-cv`.

pub mod anchors;
pub mod boxes;
pub mod depth;
pub mod error;
pub mod labels;

// Re-export commonly used types
pub use anchors::{AnchorBatch, Detection};
pub use boxes::{CenterBox, CornerBox};
pub use depth::DepthMap;
pub use error::{AnchorError, DepthError, LabelError};
pub use labels::LabelTable;
