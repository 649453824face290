//! Factory for creating compression handlers

use crate::errors::{RasterError, RasterResult};
use super::deflate::AdobeDeflateHandler;
use super::handler::CompressionHandler;
use super::lzw::LzwHandler;
use super::packbits::PackBitsHandler;
use super::uncompressed::UncompressedHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for a TIFF compression code
    ///
    /// # Arguments
    /// * `compression` - Value of the Compression tag
    ///
    /// # Returns
    /// The matching handler, or `UnsupportedCompression`
    pub fn create_handler(compression: u64) -> RasterResult<Box<dyn CompressionHandler>> {
        match compression {
            1 => Ok(Box::new(UncompressedHandler)),
            5 => Ok(Box::new(LzwHandler)),
            8 => Ok(Box::new(AdobeDeflateHandler::new())),
            32946 => Ok(Box::new(AdobeDeflateHandler::legacy())),
            32773 => Ok(Box::new(PackBitsHandler)),
            // 14 is written by some older tools for ZSTD
            14 | 50000 => Ok(Box::new(ZstdHandler::new())),
            _ => Err(RasterError::UnsupportedCompression(compression)),
        }
    }

    /// Get a handler by name, as used in configuration and on the command line
    pub fn get_handler_by_name(name: &str) -> RasterResult<Box<dyn CompressionHandler>> {
        match name.to_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Box::new(UncompressedHandler)),
            "deflate" | "zip" => Ok(Box::new(AdobeDeflateHandler::new())),
            "lzw" => Ok(Box::new(LzwHandler)),
            "packbits" => Ok(Box::new(PackBitsHandler)),
            "zstd" => Ok(Box::new(ZstdHandler::new())),
            _ => Err(RasterError::InvalidConfig(format!("Unknown compression type: {}", name))),
        }
    }
}
