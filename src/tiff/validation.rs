//! TIFF validation utilities
//!
//! Sanity checks applied while walking a possibly malformed file.

use log::error;

use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;

/// Checks that an IFD offset points inside the file, past the header
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> RasterResult<()> {
    if offset >= file_size || offset < 8 {
        return Err(RasterError::Corrupt(format!(
            "invalid IFD offset {} (file size {})",
            offset, file_size
        )));
    }
    Ok(())
}

/// Checks that `len` bytes starting at `offset` lie inside the file
pub fn validate_data_range(offset: u64, len: u64, file_size: u64) -> RasterResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= file_size => Ok(()),
        _ => Err(RasterError::Corrupt(format!(
            "data range {}+{} exceeds file size {}",
            offset, len, file_size
        ))),
    }
}

/// Validates the BigTIFF header fields following the version number
pub fn validate_bigtiff_header(reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler) -> RasterResult<()> {
    let offset_size = handler.read_u16(reader)?;
    let zeros = handler.read_u16(reader)?;

    if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
        error!("Invalid BigTIFF header: offset_size={}, zeros={}", offset_size, zeros);
        return Err(RasterError::InvalidBigTiffHeader);
    }
    Ok(())
}
