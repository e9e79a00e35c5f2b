//! Typed errors for the suppression algorithms

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuppressionError {
    #[error("{what}: got {left} and {right} entries")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },
    #[error("box {0} has non-finite coordinates")]
    NonFiniteBox(usize),
    #[error("invalid suppression config: {0}")]
    InvalidConfig(String),
}

impl SuppressionError {
    pub fn check_lengths(what: &'static str, left: usize, right: usize) -> Result<(), Self> {
        if left != right {
            return Err(SuppressionError::LengthMismatch { what, left, right });
        }
        Ok(())
    }
}
