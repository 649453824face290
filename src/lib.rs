//! Geospatial raster sources for machine-learning pipelines
//!
//! `chipkit` reads windows ("chips") out of GeoTIFFs and ordinary images,
//! masks nodata, selects channels and normalizes values with precomputed
//! statistics. The TIFF/BigTIFF driver is native; other image formats are
//! decoded with the `image` crate.

pub mod commands;
pub mod compression;
pub mod config;
pub mod coordinate;
pub mod errors;
pub mod io;
pub mod raster;
pub mod stats;
pub mod tiff;
pub mod transform;
pub mod utils;

pub use config::{BuildConfig, PipelineConfig, RasterSourceConfig, RasterStatsConfig, ScratchDir, StatsTransformerConfig};
pub use coordinate::{BoundingBox, Crs, CrsTransformer, GeoTransform, Point};
pub use errors::{ErrorKind, RasterError, RasterResult};
pub use raster::{Chip, DataType, RasterSource, Window, WindowPolicy};
pub use stats::{RasterStats, SamplePolicy};
pub use transform::{StatsMode, Transformer};
