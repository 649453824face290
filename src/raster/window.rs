//! Pixel-space windows
//!
//! A window is a half-open rectangle `[row_min, row_max) x [col_min, col_max)`.
//! Windows may extend past the raster, or lie entirely outside it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{RasterError, RasterResult};
use crate::tiff::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub row_min: i64,
    pub col_min: i64,
    pub row_max: i64,
    pub col_max: i64,
}

impl Window {
    /// Creates a window, rejecting empty or inverted rectangles
    pub fn new(row_min: i64, col_min: i64, row_max: i64, col_max: i64) -> RasterResult<Self> {
        if row_max <= row_min || col_max <= col_min {
            return Err(RasterError::InvalidWindow(format!(
                "({}, {}, {}, {}) has no area",
                row_min, col_min, row_max, col_max
            )));
        }
        Ok(Window { row_min, col_min, row_max, col_max })
    }

    /// Window covering a whole raster of the given size
    pub fn from_extent(height: u64, width: u64) -> Self {
        Window {
            row_min: 0,
            col_min: 0,
            row_max: height as i64,
            col_max: width as i64,
        }
    }

    /// Square window of `size` pixels with its top-left corner at `(row, col)`
    pub fn square(row: i64, col: i64, size: i64) -> RasterResult<Self> {
        Window::new(row, col, row + size, col + size)
    }

    pub fn height(&self) -> usize {
        (self.row_max - self.row_min).max(0) as usize
    }

    pub fn width(&self) -> usize {
        (self.col_max - self.col_min).max(0) as usize
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn translate(&self, rows: i64, cols: i64) -> Window {
        Window {
            row_min: self.row_min + rows,
            col_min: self.col_min + cols,
            row_max: self.row_max + rows,
            col_max: self.col_max + cols,
        }
    }

    /// Overlap of two windows, if any
    pub fn intersection(&self, other: &Window) -> Option<Window> {
        let row_min = self.row_min.max(other.row_min);
        let col_min = self.col_min.max(other.col_min);
        let row_max = self.row_max.min(other.row_max);
        let col_max = self.col_max.min(other.col_max);
        (row_min < row_max && col_min < col_max).then_some(Window { row_min, col_min, row_max, col_max })
    }

    /// The chunk-reader region of a window known to lie inside the raster
    pub fn to_region(&self) -> Region {
        Region::new(
            self.col_min.max(0) as u64,
            self.row_min.max(0) as u64,
            self.width() as u64,
            self.height() as u64,
        )
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.row_min, self.col_min, self.row_max, self.col_max)
    }
}

/// Parses `row_min,col_min,row_max,col_max`
impl FromStr for Window {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RasterError::InvalidWindow(format!("{:?}: {}", s, e)))?;
        match parts.as_slice() {
            [r0, c0, r1, c1] => Window::new(*r0, *c0, *r1, *c1),
            _ => Err(RasterError::InvalidWindow(format!("{:?}: expected 4 comma-separated values", s))),
        }
    }
}
