//! Error types shared by every layer of the crate
//!
//! Errors fall into three classes. Configuration errors are raised eagerly
//! while building sources and transformers, I/O errors surface from the
//! drivers, and usage errors signal calls made in the wrong lifecycle state.

use std::io;
use thiserror::Error;

/// Broad classification of a [`RasterError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration detected at build time
    Configuration,
    /// Unreadable, unsupported or corrupt input
    Io,
    /// API called in the wrong state
    Usage,
}

/// Errors raised while opening, reading or transforming rasters
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid TIFF header")]
    InvalidHeader,

    #[error("Invalid byte order marker: {0:#06x}")]
    InvalidByteOrder(u16),

    #[error("Invalid BigTIFF header")]
    InvalidBigTiffHeader,

    #[error("Unsupported TIFF version: {0}")]
    UnsupportedVersion(u16),

    #[error("Tag not found: {0}")]
    TagNotFound(u16),

    #[error("Unsupported field type: {0}")]
    UnsupportedFieldType(u16),

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u64),

    #[error("Unsupported predictor: {0}")]
    UnsupportedPredictor(u64),

    #[error("Unsupported sample format {format} with {bits} bits per sample")]
    UnsupportedSampleFormat { format: u64, bits: u64 },

    #[error("Image dimensions not found")]
    MissingDimensions,

    #[error("Corrupt raster data: {0}")]
    Corrupt(String),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported URI: {0}")]
    UnsupportedUri(String),

    #[error("Statistics record error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Channel order index {index} is out of range for {channel_count} raw channels")]
    ChannelOrder { index: usize, channel_count: usize },

    #[error("Channel {0} appears more than once in the channel order")]
    DuplicateChannel(usize),

    #[error("Statistics cover {stats_channels} channels but channel {index} was requested")]
    StatsChannelMismatch { index: usize, stats_channels: usize },

    #[error("Statistics cover {stats_channels} channels but the source has {raw_channels}")]
    StatsChannelCount { stats_channels: usize, raw_channels: usize },

    #[error("Source {uri} has {found} channels, expected {expected}")]
    SourceChannelMismatch { uri: String, expected: usize, found: usize },

    #[error("Files cannot be mosaicked: {0}")]
    IncompatibleMosaic(String),

    #[error("Reprojection from EPSG:{from} to EPSG:{to} is not supported")]
    UnsupportedReprojection { from: u32, to: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Raster source is not activated")]
    NotActivated,

    #[error("Invalid window: {0}")]
    InvalidWindow(String),
}

impl RasterError {
    /// Returns the class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            RasterError::ChannelOrder { .. }
            | RasterError::DuplicateChannel(_)
            | RasterError::StatsChannelMismatch { .. }
            | RasterError::StatsChannelCount { .. }
            | RasterError::SourceChannelMismatch { .. }
            | RasterError::IncompatibleMosaic(_)
            | RasterError::UnsupportedReprojection { .. }
            | RasterError::InvalidConfig(_)
            | RasterError::Toml(_) => ErrorKind::Configuration,
            RasterError::NotActivated | RasterError::InvalidWindow(_) => ErrorKind::Usage,
            _ => ErrorKind::Io,
        }
    }

    /// True for errors raised while validating configuration
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// Result type used throughout the crate
pub type RasterResult<T> = Result<T, RasterError>;
