use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{BuildConfig, RasterSourceConfig, RasterStatsConfig, ScratchDir};
use crate::errors::RasterResult;
use crate::raster::source::RasterSource;

/// Pipeline file: `[[sources]]` tables plus an optional `[stats]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub sources: Vec<RasterSourceConfig>,
    #[serde(default)]
    pub stats: Option<RasterStatsConfig>,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> RasterResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> RasterResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Builds every source in file order
    pub fn build_sources(&self, scratch: &ScratchDir) -> RasterResult<Vec<RasterSource>> {
        self.sources.iter().map(|config| config.build(scratch)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformerConfig;
    use crate::raster::source::WindowPolicy;
    use crate::transform::StatsMode;

    #[test]
    fn parses_full_pipeline() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [[sources]]
            uris = ["scene.tif", "file:///data/neighbour.tif"]
            channel_order = [2, 1, 0]
            x_shift = 1.5
            window_policy = "clamp"

            [[sources.transformers]]
            type = "stats"
            stats_uri = "stats.json"
            mode = "zscore"

            [[sources]]
            uris = ["other.png"]

            [stats]
            output_uri = "stats.json"

            [stats.sample]
            chip_size = 256
            sample_prob = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.len(), 2);
        let first = &config.sources[0];
        assert_eq!(first.channel_order, Some(vec![2, 1, 0]));
        assert_eq!(first.x_shift, 1.5);
        assert_eq!(first.y_shift, 0.0);
        assert_eq!(first.window_policy, WindowPolicy::Clamp);
        let TransformerConfig::Stats(t) = &first.transformers[0];
        assert_eq!(t.mode, StatsMode::ZScore);
        assert_eq!(t.max_stds, 3.0);

        let second = &config.sources[1];
        assert_eq!(second.channel_order, None);
        assert_eq!(second.window_policy, WindowPolicy::Pad);

        let stats = config.stats.unwrap();
        assert_eq!(stats.sample.chip_size, 256);
        assert_eq!(stats.sample.sample_prob, Some(0.1));
        assert_eq!(stats.sample.nodata_value, Some(0.0));
        assert_eq!(stats.sample.stride, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = PipelineConfig::from_toml_str("[[sources]]\nuris = []\nchanel_order = [0]\n").unwrap_err();
        assert!(err.is_configuration());
    }
}
