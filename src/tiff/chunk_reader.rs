//! Chunk-based image data extraction
//!
//! Reads every strip or tile intersecting a region, decompresses it,
//! reverses the predictor and copies the overlapping samples into an
//! `[rows, cols, samples]` array.

use log::{debug, trace};
use ndarray::Array3;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::raster::dtype::DataType;
use crate::tiff::constants::predictor;
use crate::tiff::layout::ImageLayout;
use crate::tiff::predictor::undo_horizontal_differencing;
use crate::tiff::region::Region;
use crate::tiff::validation::validate_data_range;

/// Decodes one sample starting at `bytes[0]`
fn decode_sample(bytes: &[u8], dtype: DataType, handler: &dyn ByteOrderHandler) -> f64 {
    match dtype {
        DataType::UInt8 => bytes[0] as f64,
        DataType::Int8 => bytes[0] as i8 as f64,
        DataType::UInt16 => handler.decode_u16(bytes) as f64,
        DataType::Int16 => handler.decode_i16(bytes) as f64,
        DataType::UInt32 => handler.decode_u32(bytes) as f64,
        DataType::Int32 => handler.decode_i32(bytes) as f64,
        DataType::Float32 => handler.decode_f32(bytes) as f64,
        DataType::Float64 => handler.decode_f64(bytes),
    }
}

/// Reads regions of one image through its [`ImageLayout`]
pub struct ChunkReader<'a> {
    layout: &'a ImageLayout,
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    compression: Box<dyn CompressionHandler>,
}

impl<'a> ChunkReader<'a> {
    pub fn new(layout: &'a ImageLayout, byte_order: ByteOrder) -> RasterResult<Self> {
        Ok(ChunkReader {
            layout,
            byte_order,
            handler: byte_order.create_handler(),
            compression: CompressionFactory::create_handler(layout.compression)?,
        })
    }

    /// Reads a region that lies inside the image
    ///
    /// # Arguments
    /// * `reader` - Stream over the TIFF file
    /// * `region` - Pixel region to read
    ///
    /// # Returns
    /// Samples shaped `[region.height, region.width, samples_per_pixel]`
    pub fn read_region(&self, reader: &mut dyn SeekableReader, region: Region) -> RasterResult<Array3<f64>> {
        let layout = self.layout;
        if region.end_x() > layout.width || region.end_y() > layout.height {
            return Err(RasterError::InvalidWindow(format!(
                "region {:?} exceeds image {}x{}",
                region, layout.width, layout.height
            )));
        }

        let mut out = Array3::<f64>::zeros((
            region.height as usize,
            region.width as usize,
            layout.samples_per_pixel,
        ));
        if region.is_empty() {
            return Ok(out);
        }

        let first_chunk_row = region.y / layout.chunk_height;
        let last_chunk_row = (region.end_y() - 1) / layout.chunk_height;
        let first_chunk_col = region.x / layout.chunk_width;
        let last_chunk_col = (region.end_x() - 1) / layout.chunk_width;
        debug!(
            "Reading region {:?} from chunk rows {}..={} cols {}..={}",
            region, first_chunk_row, last_chunk_row, first_chunk_col, last_chunk_col
        );

        for plane in 0..layout.planes() {
            for chunk_row in first_chunk_row..=last_chunk_row {
                for chunk_col in first_chunk_col..=last_chunk_col {
                    let index = layout.chunk_index(plane, chunk_row, chunk_col);
                    let Some(chunk) = self.read_chunk(reader, index, chunk_row)? else {
                        continue;
                    };
                    self.copy_chunk(&chunk, plane, chunk_row, chunk_col, region, &mut out)?;
                }
            }
        }

        Ok(out)
    }

    /// Reads and decodes one chunk; `None` for sparse (unwritten) chunks
    fn read_chunk(&self, reader: &mut dyn SeekableReader, index: usize, chunk_row: u64) -> RasterResult<Option<Vec<u8>>> {
        let layout = self.layout;
        let offset = layout.offsets[index];
        let byte_count = layout.byte_counts[index];
        if byte_count == 0 {
            trace!("Chunk {} is sparse", index);
            return Ok(None);
        }

        validate_data_range(offset, byte_count, reader.byte_len()?)?;
        let compressed = reader.read_at(offset, byte_count as usize)?;
        let mut data = self.compression.decompress(&compressed)?;

        let row_bytes = layout.chunk_row_bytes();
        let needed = row_bytes * layout.rows_in_chunk(chunk_row) as usize;
        if data.len() < needed {
            return Err(RasterError::Corrupt(format!(
                "chunk {} decoded to {} bytes, expected {}",
                index,
                data.len(),
                needed
            )));
        }
        data.truncate(needed);

        if layout.predictor == predictor::HORIZONTAL_DIFFERENCING {
            undo_horizontal_differencing(
                &mut data,
                row_bytes,
                layout.samples_per_chunk_pixel(),
                layout.bits_per_sample as usize / 8,
                self.byte_order,
            );
        }

        Ok(Some(data))
    }

    /// Copies the part of a decoded chunk overlapping `region` into `out`
    fn copy_chunk(
        &self,
        chunk: &[u8],
        plane: usize,
        chunk_row: u64,
        chunk_col: u64,
        region: Region,
        out: &mut Array3<f64>,
    ) -> RasterResult<()> {
        let layout = self.layout;
        let chunk_region = Region::new(
            chunk_col * layout.chunk_width,
            chunk_row * layout.chunk_height,
            layout.chunk_width,
            layout.rows_in_chunk(chunk_row),
        );
        let Some(overlap) = chunk_region.intersect(&region) else {
            return Ok(());
        };

        let row_bytes = layout.chunk_row_bytes();
        let spp = layout.samples_per_chunk_pixel();
        let bits = layout.bits_per_sample as usize;
        let sample_bytes = bits / 8;

        for y in overlap.y..overlap.end_y() {
            let row_start = (y - chunk_region.y) as usize * row_bytes;
            let row = &chunk[row_start..row_start + row_bytes];
            let out_row = (y - region.y) as usize;

            for x in overlap.x..overlap.end_x() {
                let out_col = (x - region.x) as usize;
                let pixel = (x - chunk_region.x) as usize;

                for s in 0..spp {
                    let sample_index = pixel * spp + s;
                    let value = if bits == 1 {
                        let byte = row[sample_index / 8];
                        ((byte >> (7 - sample_index % 8)) & 1) as f64
                    } else {
                        let start = sample_index * sample_bytes;
                        decode_sample(&row[start..start + sample_bytes], layout.dtype, &*self.handler)
                    };
                    let channel = if layout.planar { plane } else { s };
                    out[[out_row, out_col, channel]] = value;
                }
            }
        }

        Ok(())
    }
}
