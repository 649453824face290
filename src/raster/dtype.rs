//! Numeric element types of raster data

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::sample_format;

/// Element type of raw raster samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    /// Maps TIFF BitsPerSample and SampleFormat to a data type
    ///
    /// Bilevel (1-bit) data is widened to `UInt8`.
    pub fn from_tiff(bits_per_sample: u64, format: u64) -> RasterResult<Self> {
        let dtype = match (format as u16, bits_per_sample) {
            (sample_format::UNSIGNED, 1) | (sample_format::UNSIGNED, 8) => DataType::UInt8,
            (sample_format::UNSIGNED, 16) => DataType::UInt16,
            (sample_format::UNSIGNED, 32) => DataType::UInt32,
            (sample_format::SIGNED, 8) => DataType::Int8,
            (sample_format::SIGNED, 16) => DataType::Int16,
            (sample_format::SIGNED, 32) => DataType::Int32,
            (sample_format::IEEEFP, 32) => DataType::Float32,
            (sample_format::IEEEFP, 64) => DataType::Float64,
            _ => {
                return Err(RasterError::UnsupportedSampleFormat {
                    format,
                    bits: bits_per_sample,
                })
            }
        };
        Ok(dtype)
    }

    /// TIFF SampleFormat value for this type
    pub fn sample_format(&self) -> u16 {
        match self {
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => sample_format::UNSIGNED,
            DataType::Int8 | DataType::Int16 | DataType::Int32 => sample_format::SIGNED,
            DataType::Float32 | DataType::Float64 => sample_format::IEEEFP,
        }
    }

    pub fn bits(&self) -> u16 {
        self.size_in_bytes() as u16 * 8
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Smallest and largest representable values
    pub fn range(&self) -> (f64, f64) {
        match self {
            DataType::UInt8 => (u8::MIN as f64, u8::MAX as f64),
            DataType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            DataType::UInt16 => (u16::MIN as f64, u16::MAX as f64),
            DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DataType::UInt32 => (u32::MIN as f64, u32::MAX as f64),
            DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DataType::Float32 => (f32::MIN as f64, f32::MAX as f64),
            DataType::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Converts a value into this type's domain
    ///
    /// Integer types round to nearest and saturate, `NaN` becomes 0.
    /// `Float32` rounds to single precision.
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            DataType::Float64 => value,
            DataType::Float32 => value as f32 as f64,
            _ if value.is_nan() => 0.0,
            _ => {
                let (min, max) = self.range();
                value.round().clamp(min, max)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
