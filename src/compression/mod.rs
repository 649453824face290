//! Compression handling for TIFF chunks
//!
//! Each supported TIFF compression code maps to a [`CompressionHandler`]
//! strategy, created through [`CompressionFactory`].

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod lzw;
mod packbits;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use lzw::LzwHandler;
pub use packbits::PackBitsHandler;
pub use zstd::ZstdHandler;
