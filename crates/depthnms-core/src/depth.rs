//! Precomputed scene depth grid

use crate::error::DepthError;
use ndarray::{Array2, s};
use std::ops::Range;

/// Per-pixel estimated depth (larger = farther), indexed `(row, col)`.
///
/// Every value is finite and strictly positive. Lookups never clamp: an
/// index outside the grid is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    grid: Array2<f64>,
}

impl DepthMap {
    /// Wrap a grid, validating its contents
    pub fn new(grid: Array2<f64>) -> Result<Self, DepthError> {
        let (rows, cols) = grid.dim();
        if rows == 0 || cols == 0 {
            return Err(DepthError::Empty { rows, cols });
        }

        if let Some(((row, col), &value)) = grid
            .indexed_iter()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(DepthError::InvalidValue { row, col, value });
        }

        Ok(Self { grid })
    }

    /// Build from row-major values
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, DepthError> {
        let actual = values.len();
        let grid = Array2::from_shape_vec((rows, cols), values)
            .map_err(|_| DepthError::ShapeMismatch { rows, cols, actual })?;
        Self::new(grid)
    }

    /// Build from nested rows, as found in JSON depth dumps
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, DepthError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let values: Vec<f64> = rows.iter().flatten().copied().collect();
        if rows.iter().any(|r| r.len() != width) {
            return Err(DepthError::ShapeMismatch {
                rows: height,
                cols: width,
                actual: values.len(),
            });
        }
        Self::from_vec(height, width, values)
    }

    /// `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        self.grid.dim()
    }

    /// Underlying `(row, col)` grid
    pub fn grid(&self) -> &Array2<f64> {
        &self.grid
    }

    /// Depth at a signed `(row, col)` index
    pub fn at(&self, row: i64, col: i64) -> Result<f64, DepthError> {
        let (rows, cols) = self.dims();
        if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
            return Err(DepthError::OutOfBounds { row, col, rows, cols });
        }
        Ok(self.grid[[row as usize, col as usize]])
    }

    /// Arithmetic mean over the half-open region `rows x cols`.
    ///
    /// A collapsed range (start == end) is widened to the single cell at
    /// `start` so sub-pixel boxes still read the depth under them.
    pub fn region_mean(&self, rows: Range<i64>, cols: Range<i64>) -> Result<f64, DepthError> {
        let (n_rows, n_cols) = self.dims();
        let rows = rows.start..rows.end.max(rows.start.saturating_add(1));
        let cols = cols.start..cols.end.max(cols.start.saturating_add(1));

        if rows.start < 0
            || cols.start < 0
            || rows.end as usize > n_rows
            || cols.end as usize > n_cols
        {
            return Err(DepthError::RegionOutOfBounds {
                row_start: rows.start,
                row_end: rows.end,
                col_start: cols.start,
                col_end: cols.end,
                rows: n_rows,
                cols: n_cols,
            });
        }

        let region = self.grid.slice(s![
            rows.start as usize..rows.end as usize,
            cols.start as usize..cols.end as usize
        ]);
        // Non-empty by construction above.
        Ok(region.sum() / region.len() as f64)
    }
}

impl TryFrom<Array2<f64>> for DepthMap {
    type Error = DepthError;

    fn try_from(grid: Array2<f64>) -> Result<Self, Self::Error> {
        Self::new(grid)
    }
}
