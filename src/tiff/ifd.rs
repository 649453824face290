//! Image File Directory (IFD) structures and methods
//!
//! Every IFD entry keeps the raw bytes of its values exactly as stored in the
//! file, whether they were inline in the entry or at an external offset.
//! Values are decoded on demand with the file's byte order, so big-endian
//! files decode the same way as little-endian ones.

use std::collections::HashMap;
use std::fmt;
use log::trace;

use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::constants::{field_types, tags};

/// An entry in an Image File Directory
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Raw value bytes in file byte order
    pub data: Vec<u8>,
}

impl IFDEntry {
    pub fn new(tag: u16, field_type: u16, count: u64, data: Vec<u8>) -> Self {
        IFDEntry { tag, field_type, count, data }
    }

    /// SHORT entry from a slice of values
    pub fn from_u16s(tag: u16, values: &[u16], handler: &dyn ByteOrderHandler) -> Self {
        let mut data = Vec::with_capacity(values.len() * 2);
        values.iter().for_each(|v| handler.put_u16(&mut data, *v));
        IFDEntry::new(tag, field_types::SHORT, values.len() as u64, data)
    }

    /// LONG entry from a slice of values
    pub fn from_u32s(tag: u16, values: &[u32], handler: &dyn ByteOrderHandler) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        values.iter().for_each(|v| handler.put_u32(&mut data, *v));
        IFDEntry::new(tag, field_types::LONG, values.len() as u64, data)
    }

    /// LONG8 entry from a slice of values
    pub fn from_u64s(tag: u16, values: &[u64], handler: &dyn ByteOrderHandler) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        values.iter().for_each(|v| handler.put_u64(&mut data, *v));
        IFDEntry::new(tag, field_types::LONG8, values.len() as u64, data)
    }

    /// DOUBLE entry from a slice of values
    pub fn from_f64s(tag: u16, values: &[f64], handler: &dyn ByteOrderHandler) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        values.iter().for_each(|v| handler.put_f64(&mut data, *v));
        IFDEntry::new(tag, field_types::DOUBLE, values.len() as u64, data)
    }

    /// NUL-terminated ASCII entry
    pub fn from_ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        IFDEntry::new(tag, field_types::ASCII, data.len() as u64, data)
    }

    /// Size in bytes of one value of this entry's field type
    pub fn field_type_size(&self) -> RasterResult<usize> {
        field_types::size_of(self.field_type).ok_or(RasterError::UnsupportedFieldType(self.field_type))
    }

    /// Total size in bytes of this entry's values
    pub fn byte_len(&self) -> RasterResult<u64> {
        Ok(self.field_type_size()? as u64 * self.count)
    }

    /// True if the values fit in the entry's value field
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        self.data.len() <= inline_size
    }

    /// Decodes unsigned integer values
    pub fn values_u64(&self, handler: &dyn ByteOrderHandler) -> RasterResult<Vec<u64>> {
        let values = match self.field_type {
            field_types::BYTE | field_types::UNDEFINED => self.data.iter().map(|b| *b as u64).collect(),
            field_types::SHORT => self.data.chunks_exact(2).map(|c| handler.decode_u16(c) as u64).collect(),
            field_types::LONG | field_types::IFD => {
                self.data.chunks_exact(4).map(|c| handler.decode_u32(c) as u64).collect()
            }
            field_types::LONG8 | field_types::IFD8 => {
                self.data.chunks_exact(8).map(|c| handler.decode_u64(c)).collect()
            }
            other => return Err(RasterError::UnsupportedFieldType(other)),
        };
        Ok(values)
    }

    /// Decodes numeric values of any type as `f64`
    pub fn values_f64(&self, handler: &dyn ByteOrderHandler) -> RasterResult<Vec<f64>> {
        let values = match self.field_type {
            field_types::SBYTE => self.data.iter().map(|b| *b as i8 as f64).collect(),
            field_types::SSHORT => self.data.chunks_exact(2).map(|c| handler.decode_i16(c) as f64).collect(),
            field_types::SLONG => self.data.chunks_exact(4).map(|c| handler.decode_i32(c) as f64).collect(),
            field_types::SLONG8 => self.data.chunks_exact(8).map(|c| handler.decode_i64(c) as f64).collect(),
            field_types::FLOAT => self.data.chunks_exact(4).map(|c| handler.decode_f32(c) as f64).collect(),
            field_types::DOUBLE => self.data.chunks_exact(8).map(|c| handler.decode_f64(c)).collect(),
            field_types::RATIONAL => self
                .data
                .chunks_exact(8)
                .map(|c| handler.decode_u32(&c[..4]) as f64 / handler.decode_u32(&c[4..]) as f64)
                .collect(),
            field_types::SRATIONAL => self
                .data
                .chunks_exact(8)
                .map(|c| handler.decode_i32(&c[..4]) as f64 / handler.decode_i32(&c[4..]) as f64)
                .collect(),
            _ => self.values_u64(handler)?.into_iter().map(|v| v as f64).collect(),
        };
        Ok(values)
    }

    /// Decodes an ASCII value, stopping at the first NUL
    pub fn ascii(&self) -> String {
        let end = self.data.iter().position(|b| *b == 0).unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }
}

/// Represents an Image File Directory in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in file order
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Byte order the entry data is stored in
    pub byte_order: ByteOrder,
    tag_map: HashMap<u16, usize>,
}

impl IFD {
    pub fn new(number: usize, offset: u64, byte_order: ByteOrder) -> Self {
        IFD {
            entries: Vec::new(),
            number,
            offset,
            byte_order,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry, replacing any earlier entry with the same tag
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!("IFD #{}: tag {} ({}), {} values", self.number, entry.tag, tags::name(entry.tag), entry.count);

        match self.tag_map.get(&entry.tag) {
            Some(&index) => self.entries[index] = entry,
            None => {
                self.tag_map.insert(entry.tag, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&index| &self.entries[index])
    }

    /// All unsigned integer values of a tag
    pub fn get_u64_values(&self, tag: u16) -> RasterResult<Option<Vec<u64>>> {
        match self.get_entry(tag) {
            Some(entry) => Ok(Some(entry.values_u64(&*self.byte_order.create_handler())?)),
            None => Ok(None),
        }
    }

    /// All numeric values of a tag as `f64`
    pub fn get_f64_values(&self, tag: u16) -> RasterResult<Option<Vec<f64>>> {
        match self.get_entry(tag) {
            Some(entry) => Ok(Some(entry.values_f64(&*self.byte_order.create_handler())?)),
            None => Ok(None),
        }
    }

    /// First value of an unsigned integer tag
    ///
    /// Returns `None` when the tag is absent or has a non-integer type.
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.get_u64_values(tag).ok().flatten().and_then(|values| values.first().copied())
    }

    /// Value of an ASCII tag
    pub fn get_ascii(&self, tag: u16) -> Option<String> {
        self.get_entry(tag).map(IFDEntry::ascii)
    }

    /// Width and height of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Samples per pixel, defaulting to 1
    pub fn get_samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// NewSubfileType flags, defaulting to 0
    pub fn subfile_type(&self) -> u64 {
        self.get_tag_value(tags::NEW_SUBFILE_TYPE).unwrap_or(0)
    }

    /// Entries sorted by tag, as the TIFF format requires on disk
    pub fn sorted_entries(&self) -> Vec<&IFDEntry> {
        let mut entries: Vec<&IFDEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.tag);
        entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        if let Some((width, height)) = self.get_dimensions() {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }
        writeln!(f, "  Samples per pixel: {}", self.get_samples_per_pixel())?;
        for entry in self.sorted_entries() {
            writeln!(f, "    {} ({}): type {}, count {}", entry.tag, tags::name(entry.tag), entry.field_type, entry.count)?;
        }
        Ok(())
    }
}
