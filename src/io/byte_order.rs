//! Byte order handling for TIFF files
//!
//! TIFF files declare their byte order in the first two bytes of the header.
//! Everything after that, from IFD entries to pixel samples, is decoded
//! through a [`ByteOrderHandler`] selected from that marker.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io;
use std::marker::PhantomData;

use crate::errors::{RasterError, RasterResult};
use crate::io::seekable::SeekableReader;

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> RasterResult<Self> {
        let marker = reader.read_u16::<LittleEndian>()?;
        match marker {
            0x4949 => Ok(ByteOrder::LittleEndian),
            0x4D4D => Ok(ByteOrder::BigEndian),
            _ => Err(RasterError::InvalidByteOrder(marker)),
        }
    }

    /// The two marker bytes that open a file in this byte order
    pub fn marker(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler::default()),
            ByteOrder::BigEndian => Box::new(BigEndianHandler::default()),
        }
    }
}

/// Strategy for reading, decoding and encoding multi-byte values
///
/// The `decode_*` methods expect a slice at least as long as the value;
/// callers slice raw tag and sample bytes before handing them over.
pub trait ByteOrderHandler: Send + Sync {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> io::Result<u16>;
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> io::Result<u32>;
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> io::Result<u64>;

    fn decode_u16(&self, bytes: &[u8]) -> u16;
    fn decode_u32(&self, bytes: &[u8]) -> u32;
    fn decode_u64(&self, bytes: &[u8]) -> u64;
    fn decode_i16(&self, bytes: &[u8]) -> i16;
    fn decode_i32(&self, bytes: &[u8]) -> i32;
    fn decode_i64(&self, bytes: &[u8]) -> i64;
    fn decode_f32(&self, bytes: &[u8]) -> f32;
    fn decode_f64(&self, bytes: &[u8]) -> f64;

    fn put_u16(&self, out: &mut Vec<u8>, value: u16);
    fn put_u32(&self, out: &mut Vec<u8>, value: u32);
    fn put_u64(&self, out: &mut Vec<u8>, value: u64);
    fn put_f64(&self, out: &mut Vec<u8>, value: f64);

    /// The byte order this handler implements
    fn byte_order(&self) -> ByteOrder;
}

/// Handler generic over a `byteorder` endianness marker
pub struct EndianHandler<E> {
    order: ByteOrder,
    _endian: PhantomData<E>,
}

/// Little-endian byte order handler
pub type LittleEndianHandler = EndianHandler<LittleEndian>;

/// Big-endian byte order handler
pub type BigEndianHandler = EndianHandler<BigEndian>;

impl Default for EndianHandler<LittleEndian> {
    fn default() -> Self {
        EndianHandler { order: ByteOrder::LittleEndian, _endian: PhantomData }
    }
}

impl Default for EndianHandler<BigEndian> {
    fn default() -> Self {
        EndianHandler { order: ByteOrder::BigEndian, _endian: PhantomData }
    }
}

impl<E> ByteOrderHandler for EndianHandler<E>
where
    E: byteorder::ByteOrder + Send + Sync,
{
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> io::Result<u16> {
        reader.read_u16::<E>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> io::Result<u32> {
        reader.read_u32::<E>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> io::Result<u64> {
        reader.read_u64::<E>()
    }

    fn decode_u16(&self, bytes: &[u8]) -> u16 {
        E::read_u16(bytes)
    }

    fn decode_u32(&self, bytes: &[u8]) -> u32 {
        E::read_u32(bytes)
    }

    fn decode_u64(&self, bytes: &[u8]) -> u64 {
        E::read_u64(bytes)
    }

    fn decode_i16(&self, bytes: &[u8]) -> i16 {
        E::read_i16(bytes)
    }

    fn decode_i32(&self, bytes: &[u8]) -> i32 {
        E::read_i32(bytes)
    }

    fn decode_i64(&self, bytes: &[u8]) -> i64 {
        E::read_i64(bytes)
    }

    fn decode_f32(&self, bytes: &[u8]) -> f32 {
        E::read_f32(bytes)
    }

    fn decode_f64(&self, bytes: &[u8]) -> f64 {
        E::read_f64(bytes)
    }

    fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
        let mut buf = [0u8; 2];
        E::write_u16(&mut buf, value);
        out.extend_from_slice(&buf);
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        let mut buf = [0u8; 4];
        E::write_u32(&mut buf, value);
        out.extend_from_slice(&buf);
    }

    fn put_u64(&self, out: &mut Vec<u8>, value: u64) {
        let mut buf = [0u8; 8];
        E::write_u64(&mut buf, value);
        out.extend_from_slice(&buf);
    }

    fn put_f64(&self, out: &mut Vec<u8>, value: f64) {
        let mut buf = [0u8; 8];
        E::write_f64(&mut buf, value);
        out.extend_from_slice(&buf);
    }

    fn byte_order(&self) -> ByteOrder {
        self.order
    }
}
