//! Utility modules

pub mod image;
pub mod nms;

pub use self::image::{DepthImageLoader, load_depth_json};
pub use self::nms::PlainNms;
