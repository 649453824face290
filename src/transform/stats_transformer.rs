//! Normalization of chips with precomputed channel statistics

use log::debug;
use ndarray::Axis;
use serde::{Deserialize, Serialize};

use super::{ChipTransformer, TransformContext};
use crate::errors::{RasterError, RasterResult};
use crate::raster::chip::Chip;
use crate::raster::dtype::DataType;
use crate::stats::RasterStats;

/// Output produced by a [`StatsTransformer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsMode {
    /// `mean ± max_stds·std` stretched onto `0..=255`
    #[default]
    UInt8,
    /// `(x - mean) / std` as `float32`
    ZScore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsTransformer {
    stats: RasterStats,
    mode: StatsMode,
    max_stds: f64,
    clip_zscore: bool,
}

impl StatsTransformer {
    pub fn new(stats: RasterStats, mode: StatsMode, max_stds: f64) -> Self {
        StatsTransformer {
            stats,
            mode,
            max_stds,
            clip_zscore: false,
        }
    }

    /// Clips z-scores to `±max_stds`
    pub fn with_clipped_zscores(mut self, clip: bool) -> Self {
        self.clip_zscore = clip;
        self
    }

    pub fn stats(&self) -> &RasterStats {
        &self.stats
    }

    pub fn mode(&self) -> StatsMode {
        self.mode
    }

    fn stretch(&self, chip: &mut Chip, ctx: &TransformContext) {
        for (mut lane, &raw) in chip.data.axis_iter_mut(Axis(2)).zip(&ctx.channel_order) {
            let (mean, std) = (self.stats.means[raw], self.stats.stds[raw]);
            let (lo, hi) = (mean - self.max_stds * std, mean + self.max_stds * std);
            if std == 0.0 || hi <= lo {
                lane.fill(0.0);
                continue;
            }
            lane.mapv_inplace(|v| DataType::UInt8.cast((v.clamp(lo, hi) - lo) / (hi - lo) * 255.0));
        }
        chip.dtype = DataType::UInt8;
    }

    fn zscore(&self, chip: &mut Chip, ctx: &TransformContext) {
        let limit = self.clip_zscore.then_some(self.max_stds);
        for (mut lane, &raw) in chip.data.axis_iter_mut(Axis(2)).zip(&ctx.channel_order) {
            let (mean, std) = (self.stats.means[raw], self.stats.stds[raw]);
            if std == 0.0 {
                lane.fill(0.0);
                continue;
            }
            lane.mapv_inplace(|v| {
                let z = (v - mean) / std;
                DataType::Float32.cast(match limit {
                    Some(k) => z.clamp(-k, k),
                    None => z,
                })
            });
        }
        chip.dtype = DataType::Float32;
    }
}

impl ChipTransformer for StatsTransformer {
    fn validate(&self, ctx: &TransformContext) -> RasterResult<()> {
        let stats_channels = self.stats.channel_count();
        if let Some(&index) = ctx.channel_order.iter().find(|&&index| index >= stats_channels) {
            return Err(RasterError::StatsChannelMismatch { index, stats_channels });
        }
        if stats_channels != ctx.raw_channel_count {
            return Err(RasterError::StatsChannelCount {
                stats_channels,
                raw_channels: ctx.raw_channel_count,
            });
        }
        Ok(())
    }

    fn transform(&self, mut chip: Chip, ctx: &TransformContext) -> RasterResult<Chip> {
        if chip.num_channels() != ctx.channel_order.len() {
            return Err(RasterError::InvalidConfig(format!(
                "chip has {} channels but the channel order selects {}",
                chip.num_channels(),
                ctx.channel_order.len()
            )));
        }
        self.validate(ctx)?;

        match self.mode {
            StatsMode::UInt8 if ctx.raw_dtype == DataType::UInt8 => {
                debug!("Raw data is already uint8, skipping stretch");
            }
            StatsMode::UInt8 => self.stretch(&mut chip, ctx),
            StatsMode::ZScore => self.zscore(&mut chip, ctx),
        }
        Ok(chip)
    }
}
