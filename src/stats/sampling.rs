//! Choice of windows that statistics are computed over

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::{RasterError, RasterResult};
use crate::raster::window::Window;

fn default_chip_size() -> u64 {
    300
}

fn default_nodata_value() -> Option<f64> {
    Some(0.0)
}

/// How a source is sampled when computing statistics
///
/// Without `sample_prob` the whole extent is covered with a sliding window of
/// `chip_size` moved by `stride`. With it, a seeded random set of chips
/// covering roughly that fraction of the extent is drawn instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplePolicy {
    #[serde(default = "default_chip_size")]
    pub chip_size: u64,
    #[serde(default)]
    pub stride: Option<u64>,
    #[serde(default)]
    pub sample_prob: Option<f64>,
    /// Samples equal to this value are ignored
    #[serde(default = "default_nodata_value")]
    pub nodata_value: Option<f64>,
    #[serde(default)]
    pub seed: u64,
}

impl Default for SamplePolicy {
    fn default() -> Self {
        SamplePolicy {
            chip_size: default_chip_size(),
            stride: None,
            sample_prob: None,
            nodata_value: default_nodata_value(),
            seed: 0,
        }
    }
}

impl SamplePolicy {
    pub fn validate(&self) -> RasterResult<()> {
        if self.chip_size == 0 {
            return Err(RasterError::InvalidConfig("chip_size must be positive".to_string()));
        }
        if self.stride == Some(0) {
            return Err(RasterError::InvalidConfig("stride must be positive".to_string()));
        }
        if let Some(p) = self.sample_prob {
            if !(p > 0.0 && p <= 1.0) {
                return Err(RasterError::InvalidConfig(format!("sample_prob {} is not in (0, 1]", p)));
            }
        }
        Ok(())
    }

    /// Windows to read from a raster of `height` x `width` pixels
    ///
    /// Windows are clipped to the raster so padding never enters the
    /// statistics.
    pub fn windows(&self, height: u64, width: u64) -> RasterResult<Vec<Window>> {
        self.validate()?;
        let extent = Window::from_extent(height, width);
        let size = self.chip_size as i64;
        let (height, width) = (height as i64, width as i64);

        let corners: Vec<(i64, i64)> = match self.sample_prob {
            None => {
                let stride = self.stride.unwrap_or(self.chip_size) as usize;
                (0..height)
                    .step_by(stride)
                    .flat_map(|row| (0..width).step_by(stride).map(move |col| (row, col)))
                    .collect()
            }
            Some(p) => {
                let area = (height * width) as f64;
                let count = ((p * area / (size * size) as f64).round() as usize).max(1);
                let mut rng = StdRng::seed_from_u64(self.seed);
                (0..count)
                    .map(|_| {
                        let row = rng.gen_range(0..=(height - size).max(0));
                        let col = rng.gen_range(0..=(width - size).max(0));
                        (row, col)
                    })
                    .collect()
            }
        };

        let mut windows = Vec::with_capacity(corners.len());
        for (row, col) in corners {
            if let Some(window) = Window::square(row, col, size)?.intersection(&extent) {
                windows.push(window);
            }
        }
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_windows_cover_the_extent() {
        let policy = SamplePolicy { chip_size: 4, ..Default::default() };
        let windows = policy.windows(10, 6).unwrap();
        assert_eq!(windows.len(), 6);
        let covered: usize = windows.iter().map(|w| w.height() * w.width()).sum();
        assert_eq!(covered, 60);
        assert_eq!(windows[5], Window::new(8, 4, 10, 6).unwrap());
    }

    #[test]
    fn stride_overlaps_windows() {
        let policy = SamplePolicy { chip_size: 4, stride: Some(2), ..Default::default() };
        assert_eq!(policy.windows(4, 4).unwrap().len(), 4);
    }

    #[test]
    fn random_windows_are_seeded() {
        let policy = SamplePolicy { chip_size: 10, sample_prob: Some(0.5), seed: 7, ..Default::default() };
        let first = policy.windows(100, 100).unwrap();
        assert_eq!(first.len(), 50);
        assert_eq!(first, policy.windows(100, 100).unwrap());
        assert!(first.iter().all(|w| w.row_max <= 100 && w.col_max <= 100 && w.height() == 10));
    }

    #[test]
    fn random_sampling_draws_at_least_one_chip() {
        let policy = SamplePolicy { chip_size: 300, sample_prob: Some(0.01), ..Default::default() };
        let windows = policy.windows(20, 30).unwrap();
        assert_eq!(windows, vec![Window::new(0, 0, 20, 30).unwrap()]);
    }

    #[test]
    fn rejects_bad_probability() {
        let policy = SamplePolicy { sample_prob: Some(1.5), ..Default::default() };
        assert!(policy.windows(10, 10).unwrap_err().is_configuration());
    }
}
