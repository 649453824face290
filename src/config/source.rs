use serde::{Deserialize, Serialize};

use super::{BuildConfig, ScratchDir, TransformerConfig};
use crate::errors::{RasterError, RasterResult};
use crate::raster::source::{RasterSource, WindowPolicy};
use crate::raster::uri::resolve_uri;

/// One raster source
///
/// Several URIs are read as a mosaic of georeferenced files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RasterSourceConfig {
    pub uris: Vec<String>,
    /// Raw channel indices to emit; all non-alpha channels when absent
    #[serde(default)]
    pub channel_order: Option<Vec<usize>>,
    /// Shift in map units
    #[serde(default)]
    pub x_shift: f64,
    #[serde(default)]
    pub y_shift: f64,
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
    #[serde(default)]
    pub window_policy: WindowPolicy,
    /// EPSG code map coordinates are expressed in
    #[serde(default)]
    pub map_crs: Option<u32>,
}

impl RasterSourceConfig {
    pub fn new<S: Into<String>>(uris: impl IntoIterator<Item = S>) -> Self {
        RasterSourceConfig {
            uris: uris.into_iter().map(Into::into).collect(),
            channel_order: None,
            x_shift: 0.0,
            y_shift: 0.0,
            transformers: Vec::new(),
            window_policy: WindowPolicy::default(),
            map_crs: None,
        }
    }

    pub fn with_channel_order(mut self, order: Vec<usize>) -> Self {
        self.channel_order = Some(order);
        self
    }

    pub fn with_shift(mut self, x_shift: f64, y_shift: f64) -> Self {
        self.x_shift = x_shift;
        self.y_shift = y_shift;
        self
    }

    pub fn with_transformer(mut self, transformer: impl Into<TransformerConfig>) -> Self {
        self.transformers.push(transformer.into());
        self
    }
}

impl BuildConfig for RasterSourceConfig {
    type Output = RasterSource;

    fn build(&self, scratch: &ScratchDir) -> RasterResult<RasterSource> {
        if self.uris.is_empty() {
            return Err(RasterError::InvalidConfig("a raster source needs at least one URI".to_string()));
        }
        let paths = self
            .uris
            .iter()
            .map(|uri| resolve_uri(uri, scratch.path()))
            .collect::<RasterResult<Vec<_>>>()?;
        let transformers = self
            .transformers
            .iter()
            .map(|t| t.build(scratch))
            .collect::<RasterResult<Vec<_>>>()?;

        let mut builder = RasterSource::builder(self.uris.clone(), paths)
            .channel_order(self.channel_order.clone())
            .shift(self.x_shift, self.y_shift)
            .window_policy(self.window_policy)
            .map_crs(self.map_crs);
        for transformer in transformers {
            builder = builder.transformer(transformer);
        }
        builder.build()
    }
}
