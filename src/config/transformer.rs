use serde::{Deserialize, Serialize};

use super::{BuildConfig, ScratchDir};
use crate::errors::{RasterError, RasterResult};
use crate::raster::uri::resolve_uri;
use crate::stats::RasterStats;
use crate::transform::{StatsMode, StatsTransformer, Transformer};

fn default_max_stds() -> f64 {
    3.0
}

/// Normalization with statistics saved by a statistics run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsTransformerConfig {
    pub stats_uri: String,
    #[serde(default)]
    pub mode: StatsMode,
    #[serde(default = "default_max_stds")]
    pub max_stds: f64,
    /// Clip z-scores to `±max_stds`
    #[serde(default)]
    pub clip_zscore: bool,
}

impl StatsTransformerConfig {
    pub fn new(stats_uri: impl Into<String>) -> Self {
        StatsTransformerConfig {
            stats_uri: stats_uri.into(),
            mode: StatsMode::default(),
            max_stds: default_max_stds(),
            clip_zscore: false,
        }
    }

    pub fn with_mode(mut self, mode: StatsMode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildConfig for StatsTransformerConfig {
    type Output = StatsTransformer;

    fn build(&self, scratch: &ScratchDir) -> RasterResult<StatsTransformer> {
        if !(self.max_stds > 0.0) {
            return Err(RasterError::InvalidConfig(format!("max_stds must be positive, got {}", self.max_stds)));
        }
        let path = resolve_uri(&self.stats_uri, scratch.path())?;
        let stats = RasterStats::load(&path.to_string_lossy())?;
        Ok(StatsTransformer::new(stats, self.mode, self.max_stds).with_clipped_zscores(self.clip_zscore))
    }
}

/// A transformer entry, selected by its `type` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransformerConfig {
    Stats(StatsTransformerConfig),
}

impl From<StatsTransformerConfig> for TransformerConfig {
    fn from(config: StatsTransformerConfig) -> Self {
        TransformerConfig::Stats(config)
    }
}

impl BuildConfig for TransformerConfig {
    type Output = Transformer;

    fn build(&self, scratch: &ScratchDir) -> RasterResult<Transformer> {
        match self {
            TransformerConfig::Stats(config) => Ok(Transformer::Stats(config.build(scratch)?)),
        }
    }
}
