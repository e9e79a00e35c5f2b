//! Typed errors for the data model

use thiserror::Error;

/// Failures raised while building or reading a depth map
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DepthError {
    #[error("depth map is empty ({rows}x{cols})")]
    Empty { rows: usize, cols: usize },
    #[error("depth value {value} at ({row}, {col}) is not a finite positive number")]
    InvalidValue { row: usize, col: usize, value: f64 },
    #[error("depth index ({row}, {col}) outside map of shape {rows}x{cols}")]
    OutOfBounds {
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },
    #[error("depth region rows {row_start}..{row_end}, cols {col_start}..{col_end} outside map of shape {rows}x{cols}")]
    RegionOutOfBounds {
        row_start: i64,
        row_end: i64,
        col_start: i64,
        col_end: i64,
        rows: usize,
        cols: usize,
    },
    #[error("mean depth {mean} gives an undefined score (log must be positive)")]
    UndefinedScore { mean: f64 },
    #[error("depth data has {actual} values, expected {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        actual: usize,
    },
}

/// Failures raised while resolving class labels
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("no label for class index {0}")]
    Missing(usize),
    #[error("class score vector is empty")]
    NoScores,
    #[error("duplicate label entry for class index {0}")]
    Duplicate(usize),
    #[error("label key {0:?} is not a class index")]
    InvalidIndex(String),
}

/// Failures raised while parsing raw detector anchors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("anchor row has {0} columns, expected at least 5")]
    TooShort(usize),
    #[error("anchor row has {actual} class scores, expected {expected}")]
    ClassCountMismatch { expected: usize, actual: usize },
}
