//! Input loading for the command line tool

use anyhow::{Context, Result};
use depthnms_core::{AnchorBatch, DepthMap, LabelTable};
use depthnms_cv::utils::{DepthImageLoader, load_depth_json};
use std::path::Path;

use crate::args::Args;

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read `[batch][anchors][5 + classes]` rows from JSON
pub fn load_anchors<P: AsRef<Path>>(path: P) -> Result<AnchorBatch> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read anchors: {:?}", path))?;
    let rows: Vec<Vec<Vec<f64>>> =
        serde_json::from_str(&text).with_context(|| format!("Invalid anchor JSON in {:?}", path))?;
    AnchorBatch::from_rows(&rows).with_context(|| format!("Malformed anchors in {:?}", path))
}

pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<LabelTable> {
    let path = path.as_ref();
    if is_json(path) {
        LabelTable::load_json(path)
    } else {
        LabelTable::load(path)
    }
}

pub fn load_depth(args: &Args) -> Result<Option<DepthMap>> {
    let Some(depth) = args.depth.as_deref() else {
        return Ok(None);
    };

    let path = Path::new(depth);
    let map = if is_json(path) {
        load_depth_json(path)?
    } else {
        DepthImageLoader::new(args.depth_scale, args.depth_offset).load(path)?
    };
    Ok(Some(map))
}
