//! Raster statistics for normalization
//!
//! Statistics are accumulated per raw channel with Welford's algorithm over a
//! set of windows chosen by a [`SamplePolicy`].

pub mod accumulator;
pub mod raster_stats;
pub mod sampling;

pub use self::accumulator::{ChannelAccumulator, Welford};
pub use self::raster_stats::{ChipProgress, RasterStats};
pub use self::sampling::SamplePolicy;
