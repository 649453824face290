//! Streaming per-channel mean and variance

use ndarray::{Array3, Axis};

/// Welford accumulator for a single channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Welford {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the pushed values, 0 when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Population standard deviation, 0 when empty
    pub fn std(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }
}

/// One [`Welford`] per channel, skipping nodata samples
#[derive(Debug, Clone)]
pub struct ChannelAccumulator {
    channels: Vec<Welford>,
    nodata_value: Option<f64>,
}

impl ChannelAccumulator {
    pub fn new(channel_count: usize, nodata_value: Option<f64>) -> Self {
        ChannelAccumulator {
            channels: vec![Welford::default(); channel_count],
            nodata_value,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Adds every sample of a `[rows, cols, channels]` chip
    ///
    /// NaN samples are always skipped.
    pub fn update(&mut self, chip: &Array3<f64>) {
        for (acc, lane) in self.channels.iter_mut().zip(chip.axis_iter(Axis(2))) {
            for &value in lane.iter() {
                if value.is_nan() || self.nodata_value == Some(value) {
                    continue;
                }
                acc.push(value);
            }
        }
    }

    pub fn means(&self) -> Vec<f64> {
        self.channels.iter().map(Welford::mean).collect()
    }

    pub fn stds(&self) -> Vec<f64> {
        self.channels.iter().map(Welford::std).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.channels.iter().map(Welford::count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn matches_two_pass_moments() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut acc = Welford::default();
        values.iter().for_each(|v| acc.push(*v));
        assert_eq!(acc.count(), 8);
        assert_relative_eq!(acc.mean(), 5.0);
        assert_relative_eq!(acc.std(), 2.0);
    }

    #[test]
    fn empty_channel_reports_zero() {
        let acc = ChannelAccumulator::new(2, Some(0.0));
        assert_eq!(acc.means(), vec![0.0, 0.0]);
        assert_eq!(acc.stds(), vec![0.0, 0.0]);
    }

    #[test]
    fn skips_nodata_per_element() {
        let chip = Array3::from_shape_vec((1, 3, 2), vec![0.0, 1.0, 2.0, 0.0, 4.0, 3.0]).unwrap();
        let mut acc = ChannelAccumulator::new(2, Some(0.0));
        acc.update(&chip);
        assert_eq!(acc.counts(), vec![2, 2]);
        assert_relative_eq!(acc.means()[0], 3.0);
        assert_relative_eq!(acc.means()[1], 2.0);
    }
}
