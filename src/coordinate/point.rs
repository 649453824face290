//! Point structure for representing coordinates

use serde::{Deserialize, Serialize};

/// A 2D point in pixel or map space
///
/// Pixel points use `x = column` and `y = row`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Pixel point for a `(row, col)` pair
    pub fn from_row_col(row: f64, col: f64) -> Self {
        Point { x: col, y: row }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}
