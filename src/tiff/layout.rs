//! Physical layout of the image data described by an IFD
//!
//! Strips are treated as full-width chunks, so strip and tile images share
//! a single chunk grid and a single read path.

use log::debug;

use crate::compression::CompressionFactory;
use crate::errors::{RasterError, RasterResult};
use crate::raster::dtype::DataType;
use crate::tiff::constants::{planar_config, predictor, sample_format, tags};
use crate::tiff::ifd::IFD;

/// Everything needed to locate and decode the samples of one IFD
#[derive(Debug, Clone)]
pub struct ImageLayout {
    pub width: u64,
    pub height: u64,
    pub samples_per_pixel: usize,
    pub bits_per_sample: u16,
    pub dtype: DataType,
    pub compression: u64,
    pub predictor: u16,
    pub planar: bool,
    pub tiled: bool,
    pub chunk_width: u64,
    pub chunk_height: u64,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
    pub photometric: Option<u16>,
}

impl ImageLayout {
    /// Reads and validates the layout tags of an IFD
    ///
    /// # Arguments
    /// * `ifd` - Directory describing the image
    ///
    /// # Returns
    /// The layout, or an error for missing, inconsistent or unsupported tags
    pub fn from_ifd(ifd: &IFD) -> RasterResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(RasterError::MissingDimensions)?;
        if width == 0 || height == 0 {
            return Err(RasterError::MissingDimensions);
        }
        let samples_per_pixel = ifd.get_samples_per_pixel().max(1) as usize;

        let bits = ifd.get_u64_values(tags::BITS_PER_SAMPLE)?.unwrap_or_else(|| vec![1]);
        let bits_per_sample = *bits.first().unwrap_or(&1);
        if bits.iter().any(|b| *b != bits_per_sample) {
            return Err(RasterError::UnsupportedSampleFormat {
                format: sample_format::UNSIGNED as u64,
                bits: bits_per_sample,
            });
        }
        let format = ifd.get_tag_value(tags::SAMPLE_FORMAT).unwrap_or(sample_format::UNSIGNED as u64);
        let dtype = DataType::from_tiff(bits_per_sample, format)?;
        if bits_per_sample == 1 && samples_per_pixel != 1 {
            return Err(RasterError::UnsupportedSampleFormat { format, bits: 1 });
        }

        let compression = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1);
        CompressionFactory::create_handler(compression)?;

        let predictor_value = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64);
        match predictor_value as u16 {
            predictor::NONE => {}
            predictor::HORIZONTAL_DIFFERENCING if !dtype.is_float() && bits_per_sample >= 8 => {}
            _ => return Err(RasterError::UnsupportedPredictor(predictor_value)),
        }

        let planar = samples_per_pixel > 1
            && ifd.get_tag_value(tags::PLANAR_CONFIGURATION) == Some(planar_config::PLANAR as u64);

        let tiled = ifd.has_tag(tags::TILE_WIDTH);
        let (chunk_width, chunk_height, offsets_tag, counts_tag) = if tiled {
            let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).unwrap_or(0);
            let tile_height = ifd.get_tag_value(tags::TILE_LENGTH).unwrap_or(0);
            (tile_width, tile_height, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP).unwrap_or(height).min(height);
            (width, rows_per_strip, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };
        if chunk_width == 0 || chunk_height == 0 {
            return Err(RasterError::Corrupt("zero chunk dimensions".to_string()));
        }

        let offsets = ifd.get_u64_values(offsets_tag)?.ok_or(RasterError::TagNotFound(offsets_tag))?;
        let byte_counts = ifd.get_u64_values(counts_tag)?.ok_or(RasterError::TagNotFound(counts_tag))?;

        let layout = ImageLayout {
            width,
            height,
            samples_per_pixel,
            bits_per_sample: bits_per_sample as u16,
            dtype,
            compression,
            predictor: predictor_value as u16,
            planar,
            tiled,
            chunk_width,
            chunk_height,
            offsets,
            byte_counts,
            photometric: ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION).map(|p| p as u16),
        };

        let expected = layout.chunk_count();
        if layout.offsets.len() < expected || layout.byte_counts.len() < expected {
            return Err(RasterError::Corrupt(format!(
                "expected {} chunks, found {} offsets and {} byte counts",
                expected,
                layout.offsets.len(),
                layout.byte_counts.len()
            )));
        }

        debug!(
            "Layout {}x{}x{} {} ({} {}x{} chunks, compression {})",
            width,
            height,
            samples_per_pixel,
            dtype,
            if tiled { "tiled" } else { "striped" },
            chunk_width,
            chunk_height,
            compression
        );
        Ok(layout)
    }

    pub fn chunks_across(&self) -> u64 {
        self.width.div_ceil(self.chunk_width)
    }

    pub fn chunks_down(&self) -> u64 {
        self.height.div_ceil(self.chunk_height)
    }

    /// Number of sample planes stored separately
    pub fn planes(&self) -> usize {
        if self.planar {
            self.samples_per_pixel
        } else {
            1
        }
    }

    /// Interleaved samples per pixel within one chunk
    pub fn samples_per_chunk_pixel(&self) -> usize {
        if self.planar {
            1
        } else {
            self.samples_per_pixel
        }
    }

    pub fn chunk_count(&self) -> usize {
        (self.chunks_across() * self.chunks_down()) as usize * self.planes()
    }

    /// Index of a chunk in the offsets array
    pub fn chunk_index(&self, plane: usize, chunk_row: u64, chunk_col: u64) -> usize {
        let per_plane = (self.chunks_across() * self.chunks_down()) as usize;
        plane * per_plane + (chunk_row * self.chunks_across() + chunk_col) as usize
    }

    /// Bytes in one decoded chunk row
    pub fn chunk_row_bytes(&self) -> usize {
        let samples = self.chunk_width as usize * self.samples_per_chunk_pixel();
        (samples * self.bits_per_sample as usize).div_ceil(8)
    }

    /// Rows actually stored in a chunk; the last strip may be short
    pub fn rows_in_chunk(&self, chunk_row: u64) -> u64 {
        if self.tiled {
            self.chunk_height
        } else {
            self.chunk_height.min(self.height - chunk_row * self.chunk_height)
        }
    }
}
