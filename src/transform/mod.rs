//! Chip transformers applied after channel selection

pub mod stats_transformer;

pub use self::stats_transformer::{StatsMode, StatsTransformer};

use crate::errors::RasterResult;
use crate::raster::chip::Chip;
use crate::raster::dtype::DataType;

/// What a transformer knows about the source a chip came from
#[derive(Debug, Clone, PartialEq)]
pub struct TransformContext {
    /// Raw channel index of every chip channel
    pub channel_order: Vec<usize>,
    pub raw_dtype: DataType,
    pub raw_channel_count: usize,
}

/// A per-chip operation that keeps the spatial shape
pub trait ChipTransformer {
    /// Checks the transformer against a source at build time
    fn validate(&self, ctx: &TransformContext) -> RasterResult<()> {
        let _ = ctx;
        Ok(())
    }

    fn transform(&self, chip: Chip, ctx: &TransformContext) -> RasterResult<Chip>;
}

/// Every transformer a raster source can be configured with
#[derive(Debug, Clone, PartialEq)]
pub enum Transformer {
    Stats(StatsTransformer),
}

impl Transformer {
    pub fn name(&self) -> &'static str {
        match self {
            Transformer::Stats(_) => "stats",
        }
    }
}

impl ChipTransformer for Transformer {
    fn validate(&self, ctx: &TransformContext) -> RasterResult<()> {
        match self {
            Transformer::Stats(t) => t.validate(ctx),
        }
    }

    fn transform(&self, chip: Chip, ctx: &TransformContext) -> RasterResult<Chip> {
        match self {
            Transformer::Stats(t) => t.transform(chip, ctx),
        }
    }
}

impl From<StatsTransformer> for Transformer {
    fn from(t: StatsTransformer) -> Self {
        Transformer::Stats(t)
    }
}
