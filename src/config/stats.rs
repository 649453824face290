use log::info;
use serde::{Deserialize, Serialize};

use super::{BuildConfig, ScratchDir};
use crate::errors::RasterResult;
use crate::raster::source::RasterSource;
use crate::stats::{ChipProgress, RasterStats, SamplePolicy};

/// Where statistics are written and how sources are sampled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RasterStatsConfig {
    pub output_uri: String,
    #[serde(default)]
    pub sample: SamplePolicy,
}

impl RasterStatsConfig {
    pub fn new(output_uri: impl Into<String>) -> Self {
        RasterStatsConfig {
            output_uri: output_uri.into(),
            sample: SamplePolicy::default(),
        }
    }
}

impl BuildConfig for RasterStatsConfig {
    type Output = StatsAnalyzer;

    fn build(&self, _scratch: &ScratchDir) -> RasterResult<StatsAnalyzer> {
        self.sample.validate()?;
        Ok(StatsAnalyzer {
            output_uri: self.output_uri.clone(),
            policy: self.sample.clone(),
        })
    }
}

/// Computes statistics over sources and saves them
#[derive(Debug, Clone)]
pub struct StatsAnalyzer {
    output_uri: String,
    policy: SamplePolicy,
}

impl StatsAnalyzer {
    pub fn output_uri(&self) -> &str {
        &self.output_uri
    }

    pub fn run(&self, sources: &mut [RasterSource]) -> RasterResult<RasterStats> {
        self.run_with(sources, |_| {})
    }

    pub fn run_with<F>(&self, sources: &mut [RasterSource], progress: F) -> RasterResult<RasterStats>
    where
        F: FnMut(ChipProgress),
    {
        let stats = RasterStats::compute_with(sources, &self.policy, progress)?;
        stats.save(&self.output_uri)?;
        info!("Statistics of {} sources written to {}", sources.len(), self.output_uri);
        Ok(stats)
    }
}
