//! GeoTIFF writing
//!
//! Lays a file out as header, chunk data, then each IFD directly followed by
//! its out-of-line tag values. Chunk offsets are therefore known before the
//! directories that reference them are encoded.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use ndarray::{Array2, Array3};

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::coordinate::{Crs, GeoTransform};
use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::raster::dtype::DataType;
use crate::tiff::constants::{
    extra_samples, geo_keys, header, new_subfile_type, photometric, planar_config, predictor, tags,
};
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::metadata::{ColorInterp, GdalMetadata};
use crate::tiff::predictor::apply_horizontal_differencing;

/// Builder-style writer for single-image GeoTIFF files
pub struct GeoTiffWriter {
    byte_order: ByteOrder,
    big_tiff: bool,
    compression: Box<dyn CompressionHandler>,
    predictor: bool,
    tile_size: Option<u64>,
    rows_per_strip: u64,
    planar: bool,
    geotransform: Option<GeoTransform>,
    crs: Crs,
    nodata: Option<f64>,
    metadata: GdalMetadata,
    alpha_band: Option<usize>,
    mask: Option<Array2<bool>>,
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        GeoTiffWriter {
            byte_order: ByteOrder::LittleEndian,
            big_tiff: false,
            compression: Box::new(crate::compression::UncompressedHandler),
            predictor: false,
            tile_size: None,
            rows_per_strip: 64,
            planar: false,
            geotransform: None,
            crs: Crs::None,
            nodata: None,
            metadata: GdalMetadata::default(),
            alpha_band: None,
            mask: None,
        }
    }
}

impl GeoTiffWriter {
    pub fn new() -> Self {
        GeoTiffWriter::default()
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn big_tiff(mut self, big_tiff: bool) -> Self {
        self.big_tiff = big_tiff;
        self
    }

    /// Selects the compression by name (`none`, `deflate`, `lzw`, `packbits`, `zstd`)
    pub fn compression(mut self, name: &str) -> RasterResult<Self> {
        self.compression = CompressionFactory::get_handler_by_name(name)?;
        Ok(self)
    }

    /// Enables horizontal differencing; ignored for floating point data
    pub fn predictor(mut self, enabled: bool) -> Self {
        self.predictor = enabled;
        self
    }

    /// Writes square tiles of `size` pixels instead of strips
    pub fn tiled(mut self, size: u64) -> Self {
        self.tile_size = Some(size.max(16).div_ceil(16) * 16);
        self
    }

    pub fn rows_per_strip(mut self, rows: u64) -> Self {
        self.rows_per_strip = rows.max(1);
        self
    }

    pub fn planar(mut self, planar: bool) -> Self {
        self.planar = planar;
        self
    }

    pub fn geotransform(mut self, geotransform: GeoTransform) -> Self {
        self.geotransform = Some(geotransform);
        self
    }

    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// Records a color interpretation in the GDAL metadata block
    pub fn color_interp(mut self, band: usize, interp: ColorInterp) -> Self {
        self.metadata.set_color_interp(band, interp);
        self
    }

    /// Declares an extra (non-color) band as alpha through ExtraSamples
    pub fn alpha_band(mut self, band: usize) -> Self {
        self.alpha_band = Some(band);
        self
    }

    /// Adds an internal 1-bit transparency mask; `true` marks valid pixels
    pub fn mask(mut self, mask: Array2<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Writes `data` (`[rows, cols, bands]`) as a file on disk
    pub fn write(&self, path: &Path, data: &Array3<f64>, dtype: DataType) -> RasterResult<()> {
        info!("Writing GeoTIFF to {}", path.display());
        let bytes = self.encode(data, dtype)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, File::create(path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Encodes `data` (`[rows, cols, bands]`) into the bytes of a TIFF file
    pub fn encode(&self, data: &Array3<f64>, dtype: DataType) -> RasterResult<Vec<u8>> {
        let (height, width, bands) = data.dim();
        if height == 0 || width == 0 || bands == 0 {
            return Err(RasterError::MissingDimensions);
        }
        if let Some(mask) = &self.mask {
            if mask.dim() != (height, width) {
                return Err(RasterError::InvalidConfig(format!(
                    "mask is {:?}, image is {}x{}",
                    mask.dim(),
                    height,
                    width
                )));
            }
        }

        let handler = self.byte_order.create_handler();
        let header_size = if self.big_tiff { 16 } else { 8 };
        let mut out = vec![0u8; header_size];

        let image = ChunkPlan::for_image(self, width as u64, height as u64, bands, dtype);
        let (offsets, counts) = self.write_chunks(&mut out, &image, |plane, x, y, s| {
            let band = if image.planar { plane } else { s };
            data[[y, x, band]]
        })?;
        let mut ifds = vec![self.image_ifd(&image, &offsets, &counts, &*handler)?];

        if let Some(mask) = &self.mask {
            let plan = ChunkPlan::for_mask(self, width as u64, height as u64);
            let (offsets, counts) = self.write_chunks(&mut out, &plan, |_, x, y, _| {
                if mask[[y, x]] {
                    1.0
                } else {
                    0.0
                }
            })?;
            ifds.push(self.mask_ifd(&plan, &offsets, &counts, &*handler)?);
        }

        let first_ifd = self.append_ifds(&mut out, &ifds, &*handler)?;

        let mut head = Vec::with_capacity(header_size);
        head.extend_from_slice(&self.byte_order.marker());
        if self.big_tiff {
            handler.put_u16(&mut head, header::BIG_TIFF_VERSION);
            handler.put_u16(&mut head, header::BIGTIFF_OFFSET_SIZE);
            handler.put_u16(&mut head, 0);
            handler.put_u64(&mut head, first_ifd);
        } else {
            handler.put_u16(&mut head, header::TIFF_VERSION);
            handler.put_u32(&mut head, self.checked_offset(first_ifd)?);
        }
        out[..header_size].copy_from_slice(&head);

        debug!("Encoded {}x{}x{} {} into {} bytes", width, height, bands, dtype, out.len());
        Ok(out)
    }

    fn checked_offset(&self, offset: u64) -> RasterResult<u32> {
        u32::try_from(offset)
            .map_err(|_| RasterError::InvalidConfig("file exceeds 4 GiB, enable BigTIFF".to_string()))
    }

    /// Appends every chunk of `plan` and returns their offsets and byte counts
    fn write_chunks<F>(&self, out: &mut Vec<u8>, plan: &ChunkPlan, sample: F) -> RasterResult<(Vec<u64>, Vec<u64>)>
    where
        F: Fn(usize, usize, usize, usize) -> f64,
    {
        let handler = self.byte_order.create_handler();
        let mut offsets = Vec::new();
        let mut counts = Vec::new();

        for plane in 0..plan.planes() {
            for chunk_row in 0..plan.height.div_ceil(plan.chunk_height) {
                for chunk_col in 0..plan.width.div_ceil(plan.chunk_width) {
                    let rows = if plan.tiled {
                        plan.chunk_height
                    } else {
                        plan.chunk_height.min(plan.height - chunk_row * plan.chunk_height)
                    };
                    let mut raw = Vec::with_capacity(plan.row_bytes() * rows as usize);

                    for r in 0..rows {
                        let y = chunk_row * plan.chunk_height + r;
                        let mut row = Vec::with_capacity(plan.row_bytes());
                        let mut bits = BitPacker::default();
                        for c in 0..plan.chunk_width {
                            let x = chunk_col * plan.chunk_width + c;
                            for s in 0..plan.samples_per_chunk_pixel() {
                                let value = if x < plan.width && y < plan.height {
                                    sample(plane, x as usize, y as usize, s)
                                } else {
                                    0.0
                                };
                                if plan.bits == 1 {
                                    bits.push(&mut row, value != 0.0);
                                } else {
                                    encode_sample(&mut row, value, plan.dtype, &*handler);
                                }
                            }
                        }
                        bits.flush(&mut row);
                        raw.extend_from_slice(&row);
                    }

                    if plan.predictor {
                        apply_horizontal_differencing(
                            &mut raw,
                            plan.row_bytes(),
                            plan.samples_per_chunk_pixel(),
                            plan.dtype.size_in_bytes(),
                            self.byte_order,
                        );
                    }

                    let packed = self.compression.compress(&raw)?;
                    offsets.push(out.len() as u64);
                    counts.push(packed.len() as u64);
                    out.extend_from_slice(&packed);
                    if out.len() % 2 == 1 {
                        out.push(0);
                    }
                }
            }
        }

        Ok((offsets, counts))
    }

    /// Entries shared by the image and mask directories
    fn layout_entries(
        &self,
        ifd: &mut IFD,
        plan: &ChunkPlan,
        offsets: &[u64],
        counts: &[u64],
        handler: &dyn ByteOrderHandler,
    ) -> RasterResult<()> {
        ifd.add_entry(IFDEntry::from_u32s(tags::IMAGE_WIDTH, &[plan.width as u32], handler));
        ifd.add_entry(IFDEntry::from_u32s(tags::IMAGE_LENGTH, &[plan.height as u32], handler));
        ifd.add_entry(IFDEntry::from_u16s(tags::BITS_PER_SAMPLE, &vec![plan.bits; plan.bands], handler));
        ifd.add_entry(IFDEntry::from_u16s(tags::COMPRESSION, &[self.compression.code() as u16], handler));
        ifd.add_entry(IFDEntry::from_u16s(tags::SAMPLES_PER_PIXEL, &[plan.bands as u16], handler));

        let (offsets_tag, counts_tag) = if plan.tiled {
            ifd.add_entry(IFDEntry::from_u32s(tags::TILE_WIDTH, &[plan.chunk_width as u32], handler));
            ifd.add_entry(IFDEntry::from_u32s(tags::TILE_LENGTH, &[plan.chunk_height as u32], handler));
            (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            ifd.add_entry(IFDEntry::from_u32s(tags::ROWS_PER_STRIP, &[plan.chunk_height as u32], handler));
            (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        if self.big_tiff {
            ifd.add_entry(IFDEntry::from_u64s(offsets_tag, offsets, handler));
            ifd.add_entry(IFDEntry::from_u64s(counts_tag, counts, handler));
        } else {
            let offsets = offsets.iter().map(|o| self.checked_offset(*o)).collect::<RasterResult<Vec<u32>>>()?;
            let counts: Vec<u32> = counts.iter().map(|c| *c as u32).collect();
            ifd.add_entry(IFDEntry::from_u32s(offsets_tag, &offsets, handler));
            ifd.add_entry(IFDEntry::from_u32s(counts_tag, &counts, handler));
        }
        Ok(())
    }

    fn image_ifd(
        &self,
        plan: &ChunkPlan,
        offsets: &[u64],
        counts: &[u64],
        handler: &dyn ByteOrderHandler,
    ) -> RasterResult<IFD> {
        let mut ifd = IFD::new(0, 0, self.byte_order);
        self.layout_entries(&mut ifd, plan, offsets, counts, handler)?;

        let rgb = plan.dtype == DataType::UInt8 && plan.bands >= 3;
        let (interp, color_bands) = if rgb {
            (photometric::RGB, 3)
        } else {
            (photometric::BLACK_IS_ZERO, 1)
        };
        ifd.add_entry(IFDEntry::from_u16s(tags::PHOTOMETRIC_INTERPRETATION, &[interp], handler));

        if plan.bands > color_bands {
            let extra: Vec<u16> = (color_bands..plan.bands)
                .map(|band| {
                    if Some(band) == self.alpha_band {
                        extra_samples::UNASSOCIATED_ALPHA
                    } else {
                        extra_samples::UNSPECIFIED
                    }
                })
                .collect();
            ifd.add_entry(IFDEntry::from_u16s(tags::EXTRA_SAMPLES, &extra, handler));
        }

        let config = if plan.planar { planar_config::PLANAR } else { planar_config::CHUNKY };
        ifd.add_entry(IFDEntry::from_u16s(tags::PLANAR_CONFIGURATION, &[config], handler));
        if plan.predictor {
            ifd.add_entry(IFDEntry::from_u16s(tags::PREDICTOR, &[predictor::HORIZONTAL_DIFFERENCING], handler));
        }
        ifd.add_entry(IFDEntry::from_u16s(
            tags::SAMPLE_FORMAT,
            &vec![plan.dtype.sample_format(); plan.bands],
            handler,
        ));
        ifd.add_entry(IFDEntry::from_ascii(tags::SOFTWARE, concat!("chipkit ", env!("CARGO_PKG_VERSION"))));

        self.geo_entries(&mut ifd, handler);

        if !self.metadata.items.is_empty() {
            ifd.add_entry(IFDEntry::from_ascii(tags::GDAL_METADATA, &self.metadata.to_xml()));
        }
        if let Some(nodata) = self.nodata {
            ifd.add_entry(IFDEntry::from_ascii(tags::GDAL_NODATA, &format_nodata(nodata)));
        }
        Ok(ifd)
    }

    fn mask_ifd(&self, plan: &ChunkPlan, offsets: &[u64], counts: &[u64], handler: &dyn ByteOrderHandler) -> RasterResult<IFD> {
        let mut ifd = IFD::new(1, 0, self.byte_order);
        ifd.add_entry(IFDEntry::from_u32s(
            tags::NEW_SUBFILE_TYPE,
            &[new_subfile_type::TRANSPARENCY_MASK as u32],
            handler,
        ));
        self.layout_entries(&mut ifd, plan, offsets, counts, handler)?;
        ifd.add_entry(IFDEntry::from_u16s(
            tags::PHOTOMETRIC_INTERPRETATION,
            &[photometric::TRANSPARENCY_MASK],
            handler,
        ));
        Ok(ifd)
    }

    /// GeoTIFF model tags and key directory
    fn geo_entries(&self, ifd: &mut IFD, handler: &dyn ByteOrderHandler) {
        let Some(gt) = self.geotransform else {
            return;
        };
        let [x0, pw, rx, y0, ry, ph] = gt.coefficients();
        if gt.is_north_up() {
            ifd.add_entry(IFDEntry::from_f64s(tags::MODEL_PIXEL_SCALE_TAG, &[pw, -ph, 0.0], handler));
            ifd.add_entry(IFDEntry::from_f64s(tags::MODEL_TIEPOINT_TAG, &[0.0, 0.0, 0.0, x0, y0, 0.0], handler));
        } else {
            let matrix = [
                pw, rx, 0.0, x0, //
                ry, ph, 0.0, y0, //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ];
            ifd.add_entry(IFDEntry::from_f64s(tags::MODEL_TRANSFORMATION_TAG, &matrix, handler));
        }

        let mut keys: Vec<[u16; 4]> = Vec::new();
        let mut ascii = String::new();
        match &self.crs {
            Crs::None => {}
            Crs::Epsg(code) if u16::try_from(*code).is_ok() => {
                let (model, key) = if (4000..5000).contains(code) {
                    (geo_keys::MODEL_TYPE_GEOGRAPHIC, geo_keys::GEOGRAPHIC_TYPE)
                } else {
                    (geo_keys::MODEL_TYPE_PROJECTED, geo_keys::PROJECTED_CS_TYPE)
                };
                keys.push([geo_keys::GT_MODEL_TYPE, 0, 1, model]);
                keys.push([geo_keys::GT_RASTER_TYPE, 0, 1, geo_keys::RASTER_PIXEL_IS_AREA]);
                keys.push([key, 0, 1, *code as u16]);
            }
            other => {
                // codes beyond SHORT range can only be carried as a citation
                let citation = match other {
                    Crs::Unidentified(citation) => citation.clone(),
                    _ => other.to_string(),
                };
                ascii = format!("{}|", citation);
                keys.push([geo_keys::GT_MODEL_TYPE, 0, 1, geo_keys::MODEL_TYPE_PROJECTED]);
                keys.push([geo_keys::GT_RASTER_TYPE, 0, 1, geo_keys::RASTER_PIXEL_IS_AREA]);
                keys.push([geo_keys::PROJECTED_CS_TYPE, 0, 1, geo_keys::USER_DEFINED]);
                keys.push([geo_keys::PROJ_CITATION, tags::GEO_ASCII_PARAMS_TAG, ascii.len() as u16, 0]);
            }
        }
        if keys.is_empty() {
            return;
        }

        let mut directory = vec![1, 1, 0, keys.len() as u16];
        keys.iter().for_each(|k| directory.extend_from_slice(k));
        ifd.add_entry(IFDEntry::from_u16s(tags::GEO_KEY_DIRECTORY_TAG, &directory, handler));
        if !ascii.is_empty() {
            ifd.add_entry(IFDEntry::from_ascii(tags::GEO_ASCII_PARAMS_TAG, &ascii));
        }
    }

    /// Appends the directories and returns the offset of the first one
    fn append_ifds(&self, out: &mut Vec<u8>, ifds: &[IFD], handler: &dyn ByteOrderHandler) -> RasterResult<u64> {
        let first = out.len() as u64;
        for (i, ifd) in ifds.iter().enumerate() {
            let offset = out.len() as u64;
            let size = self.ifd_block_size(ifd)?;
            let next = if i + 1 < ifds.len() { offset + size } else { 0 };
            let block = self.encode_ifd(ifd, offset, next, handler)?;
            out.extend_from_slice(&block);
        }
        Ok(first)
    }

    fn entry_table_size(&self, ifd: &IFD) -> u64 {
        let n = ifd.entry_count() as u64;
        if self.big_tiff {
            8 + 20 * n + 8
        } else {
            2 + 12 * n + 4
        }
    }

    /// Bytes taken by a directory and its out-of-line values
    fn ifd_block_size(&self, ifd: &IFD) -> RasterResult<u64> {
        let mut size = self.entry_table_size(ifd);
        for entry in &ifd.entries {
            if !entry.is_value_inline(self.big_tiff) {
                size += entry.data.len().div_ceil(2) as u64 * 2;
            }
        }
        Ok(size)
    }

    fn encode_ifd(&self, ifd: &IFD, offset: u64, next: u64, handler: &dyn ByteOrderHandler) -> RasterResult<Vec<u8>> {
        let mut table = Vec::new();
        let mut external = Vec::new();
        let external_base = offset + self.entry_table_size(ifd);
        let inline_size = if self.big_tiff { 8 } else { 4 };

        if self.big_tiff {
            handler.put_u64(&mut table, ifd.entry_count() as u64);
        } else {
            handler.put_u16(&mut table, ifd.entry_count() as u16);
        }

        for entry in ifd.sorted_entries() {
            handler.put_u16(&mut table, entry.tag);
            handler.put_u16(&mut table, entry.field_type);
            if self.big_tiff {
                handler.put_u64(&mut table, entry.count);
            } else {
                handler.put_u32(&mut table, entry.count as u32);
            }

            if entry.is_value_inline(self.big_tiff) {
                let mut value = entry.data.clone();
                value.resize(inline_size, 0);
                table.extend_from_slice(&value);
            } else {
                let data_offset = external_base + external.len() as u64;
                if self.big_tiff {
                    handler.put_u64(&mut table, data_offset);
                } else {
                    handler.put_u32(&mut table, self.checked_offset(data_offset)?);
                }
                external.extend_from_slice(&entry.data);
                if external.len() % 2 == 1 {
                    external.push(0);
                }
            }
        }

        if self.big_tiff {
            handler.put_u64(&mut table, next);
        } else {
            handler.put_u32(&mut table, self.checked_offset(next)?);
        }

        table.extend_from_slice(&external);
        Ok(table)
    }
}

/// Chunk grid and sample encoding of one image being written
struct ChunkPlan {
    width: u64,
    height: u64,
    bands: usize,
    bits: u16,
    dtype: DataType,
    planar: bool,
    tiled: bool,
    predictor: bool,
    chunk_width: u64,
    chunk_height: u64,
}

impl ChunkPlan {
    fn for_image(writer: &GeoTiffWriter, width: u64, height: u64, bands: usize, dtype: DataType) -> Self {
        let (tiled, chunk_width, chunk_height) = match writer.tile_size {
            Some(size) => (true, size, size),
            None => (false, width, writer.rows_per_strip.min(height)),
        };
        ChunkPlan {
            width,
            height,
            bands,
            bits: dtype.bits(),
            dtype,
            planar: writer.planar && bands > 1,
            tiled,
            predictor: writer.predictor && !dtype.is_float(),
            chunk_width,
            chunk_height,
        }
    }

    fn for_mask(writer: &GeoTiffWriter, width: u64, height: u64) -> Self {
        let mut plan = ChunkPlan::for_image(writer, width, height, 1, DataType::UInt8);
        plan.bits = 1;
        plan.predictor = false;
        plan
    }

    fn planes(&self) -> usize {
        if self.planar {
            self.bands
        } else {
            1
        }
    }

    fn samples_per_chunk_pixel(&self) -> usize {
        if self.planar {
            1
        } else {
            self.bands
        }
    }

    fn row_bytes(&self) -> usize {
        (self.chunk_width as usize * self.samples_per_chunk_pixel() * self.bits as usize).div_ceil(8)
    }
}

/// Packs booleans MSB-first into bytes
#[derive(Default)]
struct BitPacker {
    current: u8,
    filled: u8,
}

impl BitPacker {
    fn push(&mut self, out: &mut Vec<u8>, bit: bool) {
        self.current |= (bit as u8) << (7 - self.filled);
        self.filled += 1;
        if self.filled == 8 {
            self.flush(out);
        }
    }

    fn flush(&mut self, out: &mut Vec<u8>) {
        if self.filled > 0 {
            out.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }
}

/// Appends one sample in `dtype`'s encoding
fn encode_sample(out: &mut Vec<u8>, value: f64, dtype: DataType, handler: &dyn ByteOrderHandler) {
    let value = dtype.cast(value);
    match dtype {
        DataType::UInt8 => out.push(value as u8),
        DataType::Int8 => out.push(value as i8 as u8),
        DataType::UInt16 => handler.put_u16(out, value as u16),
        DataType::Int16 => handler.put_u16(out, value as i16 as u16),
        DataType::UInt32 => handler.put_u32(out, value as u32),
        DataType::Int32 => handler.put_u32(out, value as i32 as u32),
        DataType::Float32 => handler.put_u32(out, (value as f32).to_bits()),
        DataType::Float64 => handler.put_f64(out, value),
    }
}

/// GDAL's textual nodata form
fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
