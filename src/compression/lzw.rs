//! Handler for TIFF LZW compressed data

use weezl::{decode::Decoder, encode::Encoder, BitOrder};

use crate::errors::{RasterError, RasterResult};
use super::handler::CompressionHandler;

/// LZW compression handler (compression code 5)
///
/// TIFF LZW is MSB-first with the early code-size switch.
pub struct LzwHandler;

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8]) -> RasterResult<Vec<u8>> {
        let mut decoder = Decoder::with_tiff_size_switch(BitOrder::Msb, 8);
        decoder
            .decode(data)
            .map_err(|e| RasterError::Corrupt(format!("LZW stream: {}", e)))
    }

    fn compress(&self, data: &[u8]) -> RasterResult<Vec<u8>> {
        let mut encoder = Encoder::with_tiff_size_switch(BitOrder::Msb, 8);
        encoder
            .encode(data)
            .map_err(|e| RasterError::Corrupt(format!("LZW encoding: {}", e)))
    }

    fn name(&self) -> &'static str {
        "LZW"
    }

    fn code(&self) -> u64 {
        5
    }
}
