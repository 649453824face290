//! Native GeoTIFF driver
//!
//! Reads TIFF and BigTIFF files in either byte order, decodes strips and
//! tiles through the compression handlers, and extracts GeoTIFF
//! georeferencing plus GDAL band metadata. A writer produces the same
//! layouts for fixtures and chip export.

pub mod chunk_reader;
pub(crate) mod constants;
pub mod geokeys;
pub mod ifd;
pub mod layout;
pub mod metadata;
pub(crate) mod predictor;
pub mod reader;
pub mod region;
pub(crate) mod types;
pub(crate) mod validation;
pub mod writer;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use chunk_reader::ChunkReader;
pub use geokeys::{GeoKeyEntry, GeoKeyParser, GeoReference};
pub use ifd::{IFDEntry, IFD};
pub use layout::ImageLayout;
pub use metadata::{BandMetadata, ColorInterp, GdalMetadata};
pub use reader::TiffReader;
pub use region::Region;
pub use types::TIFF;
pub use writer::GeoTiffWriter;
