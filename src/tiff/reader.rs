//! TIFF file reader implementation
//!
//! Parses the header and walks the IFD chain of TIFF and BigTIFF files,
//! resolving every entry's values into raw bytes.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// Upper bound on the IFD chain length
const MAX_IFDS: usize = 1024;

/// Reader for TIFF and BigTIFF files
#[derive(Default)]
pub struct TiffReader {
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    is_big_tiff: bool,
}

impl TiffReader {
    pub fn new() -> Self {
        TiffReader::default()
    }

    fn handler(&self) -> RasterResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref().ok_or(RasterError::InvalidHeader)
    }

    /// Loads the TIFF structure of a file on disk
    pub fn load(&mut self, path: &Path) -> RasterResult<TIFF> {
        info!("Loading TIFF file: {}", path.display());
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        self.read(&mut reader)
    }

    /// Reads a TIFF structure from any seekable reader
    ///
    /// # Arguments
    /// * `reader` - Stream positioned anywhere; reading starts at offset 0
    ///
    /// # Returns
    /// The byte order, flavour and IFD chain of the file
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> RasterResult<TIFF> {
        reader.rewind()?;
        let byte_order = ByteOrder::detect(reader)?;
        self.byte_order_handler = Some(byte_order.create_handler());
        let handler = self.handler()?;

        let version = handler.read_u16(reader)?;
        let first_ifd_offset = match version {
            header::TIFF_VERSION => handler.read_u32(reader)? as u64,
            header::BIG_TIFF_VERSION => {
                validation::validate_bigtiff_header(reader, handler)?;
                handler.read_u64(reader)?
            }
            other => return Err(RasterError::UnsupportedVersion(other)),
        };
        self.is_big_tiff = version == header::BIG_TIFF_VERSION;
        debug!("{} {}, first IFD at {}", byte_order.name(), if self.is_big_tiff { "BigTIFF" } else { "TIFF" }, first_ifd_offset);

        let file_size = reader.byte_len()?;
        validation::validate_ifd_offset(first_ifd_offset, file_size)?;

        let mut tiff = TIFF::new(self.is_big_tiff, byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size, byte_order)?;
        if tiff.ifds.is_empty() {
            return Err(RasterError::InvalidHeader);
        }

        debug!("Read {} IFDs", tiff.ifds.len());
        Ok(tiff)
    }

    /// Follows the chain of IFDs starting at `first_ifd_offset`
    ///
    /// A broken link after the first IFD ends the chain with a warning.
    fn read_ifd_chain(
        &self,
        reader: &mut dyn SeekableReader,
        first_ifd_offset: u64,
        file_size: u64,
        byte_order: ByteOrder,
    ) -> RasterResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = first_ifd_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            if !seen.insert(offset) {
                warn!("IFD chain loops back to offset {}, stopping", offset);
                break;
            }

            let (ifd, next) = match self.read_ifd(reader, offset, ifds.len(), file_size, byte_order) {
                Ok(result) => result,
                Err(e) if !ifds.is_empty() => {
                    warn!("Error reading IFD {}: {}", ifds.len(), e);
                    break;
                }
                Err(e) => return Err(e),
            };
            ifds.push(ifd);

            if next != 0 && validation::validate_ifd_offset(next, file_size).is_err() {
                warn!("Invalid next IFD offset {}, stopping IFD chain", next);
                break;
            }
            offset = next;
        }

        Ok(ifds)
    }

    /// Reads one IFD and returns it with the offset of the next one
    pub fn read_ifd(
        &self,
        reader: &mut dyn SeekableReader,
        offset: u64,
        number: usize,
        file_size: u64,
        byte_order: ByteOrder,
    ) -> RasterResult<(IFD, u64)> {
        let handler = self.handler()?;
        reader.seek(std::io::SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        let entry_size = if self.is_big_tiff { 20 } else { 12 };
        validation::validate_data_range(offset, entry_count.saturating_mul(entry_size), file_size)?;

        let mut raw_entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            raw_entries.push(self.read_raw_entry(reader)?);
        }
        let next = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let mut ifd = IFD::new(number, offset, byte_order);
        for (tag, field_type, count, value_field) in raw_entries {
            match self.resolve_entry(reader, tag, field_type, count, &value_field, file_size) {
                Ok(entry) => ifd.add_entry(entry),
                Err(RasterError::UnsupportedFieldType(ft)) => {
                    warn!("Skipping tag {} with unsupported field type {}", tag, ft);
                }
                Err(e) => return Err(e),
            }
        }

        debug!("IFD #{} at {} with {} entries", number, offset, ifd.entry_count());
        Ok((ifd, next))
    }

    /// Reads tag, type, count and the undecoded value field of one entry
    fn read_raw_entry(&self, reader: &mut dyn SeekableReader) -> RasterResult<(u16, u16, u64, Vec<u8>)> {
        let handler = self.handler()?;
        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let mut value_field = vec![0u8; if self.is_big_tiff { 8 } else { 4 }];
        reader.read_exact(&mut value_field)?;
        Ok((tag, field_type, count, value_field))
    }

    /// Produces an entry holding the value bytes, inline or external
    fn resolve_entry(
        &self,
        reader: &mut dyn SeekableReader,
        tag: u16,
        field_type: u16,
        count: u64,
        value_field: &[u8],
        file_size: u64,
    ) -> RasterResult<IFDEntry> {
        let handler = self.handler()?;
        let mut entry = IFDEntry::new(tag, field_type, count, Vec::new());
        let len = entry.byte_len()?;

        entry.data = if len <= value_field.len() as u64 {
            value_field[..len as usize].to_vec()
        } else {
            let data_offset = if self.is_big_tiff {
                handler.decode_u64(value_field)
            } else {
                handler.decode_u32(value_field) as u64
            };
            validation::validate_data_range(data_offset, len, file_size)?;
            reader.read_at(data_offset, len as usize)?
        };

        Ok(entry)
    }

    /// Whether the last file read was a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }
}
