//! Chips: windows of raster values ready for consumption

use ndarray::{Array3, Axis};

use crate::raster::dtype::DataType;

/// `[rows, cols, channels]` samples tagged with their logical type
#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    pub data: Array3<f64>,
    pub dtype: DataType,
}

impl Chip {
    pub fn new(data: Array3<f64>, dtype: DataType) -> Self {
        Chip { data, dtype }
    }

    pub fn zeros(rows: usize, cols: usize, channels: usize, dtype: DataType) -> Self {
        Chip::new(Array3::zeros((rows, cols, channels)), dtype)
    }

    /// `(rows, cols, channels)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn num_channels(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Selects and permutes channels
    ///
    /// Indices must be valid; channel orders are checked when a source is built.
    pub fn select_channels(&self, order: &[usize]) -> Chip {
        Chip::new(self.data.select(Axis(2), order), self.dtype)
    }

    /// Sum of every sample
    pub fn sum(&self) -> f64 {
        self.data.sum()
    }
}
