//! Low-level I/O plumbing
//!
//! Byte-order aware decoding for TIFF structures and the seekable reader
//! abstraction the drivers read through.

pub mod seekable;
pub mod byte_order;

pub use byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use seekable::SeekableReader;
