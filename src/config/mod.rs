//! Declarative configuration
//!
//! Every config struct deserializes from TOML with `serde` and turns into its
//! runtime object through [`BuildConfig::build`]. Building is where
//! configuration errors surface: bad channel orders, missing statistics,
//! unsupported URIs.

mod pipeline;
mod source;
mod stats;
mod transformer;

pub use self::pipeline::PipelineConfig;
pub use self::source::RasterSourceConfig;
pub use self::stats::{RasterStatsConfig, StatsAnalyzer};
pub use self::transformer::{StatsTransformerConfig, TransformerConfig};
pub use crate::stats::SamplePolicy;

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::errors::RasterResult;

/// Turns a configuration into the object it describes
pub trait BuildConfig {
    type Output;

    fn build(&self, scratch: &ScratchDir) -> RasterResult<Self::Output>;
}

/// Directory for files produced while building, such as decompressed inputs
#[derive(Debug)]
pub enum ScratchDir {
    /// Removed when dropped
    Owned(TempDir),
    Borrowed(PathBuf),
}

impl ScratchDir {
    /// A fresh temporary directory
    pub fn temporary() -> io::Result<Self> {
        Ok(ScratchDir::Owned(tempfile::Builder::new().prefix("chipkit-").tempdir()?))
    }

    /// An existing directory the caller manages
    pub fn at(path: impl Into<PathBuf>) -> Self {
        ScratchDir::Borrowed(path.into())
    }

    pub fn path(&self) -> &Path {
        match self {
            ScratchDir::Owned(dir) => dir.path(),
            ScratchDir::Borrowed(path) => path,
        }
    }
}
