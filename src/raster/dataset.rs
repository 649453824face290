//! Opened raster datasets
//!
//! A [`Dataset`] is an open handle onto raster data. Reads accept any window:
//! pixels outside the raster come back as zero and invalid. GeoTIFFs go
//! through the native TIFF driver, other image formats through `image`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, ImageDecoder, ImageReader};
use log::{debug, info};
use ndarray::{s, Array2, Array3, Axis};

use crate::coordinate::{Crs, GeoTransform};
use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::ByteOrder;
use crate::raster::dtype::DataType;
use crate::raster::mosaic::Mosaic;
use crate::raster::window::Window;
use crate::tiff::chunk_reader::ChunkReader;
use crate::tiff::geokeys::{GeoKeyParser, GeoReference};
use crate::tiff::layout::ImageLayout;
use crate::tiff::metadata::{BandMetadata, ColorInterp};
use crate::tiff::reader::TiffReader;

/// Header-level description of a dataset, known without reading pixels
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub width: u64,
    pub height: u64,
    pub channel_count: usize,
    pub dtype: DataType,
    pub georef: GeoReference,
    pub bands: BandMetadata,
    /// Whether reads can report pixels as invalid beyond nodata
    pub has_mask: bool,
}

impl DatasetInfo {
    pub fn extent(&self) -> Window {
        Window::from_extent(self.height, self.width)
    }

    pub fn geotransform(&self) -> Option<GeoTransform> {
        self.georef.geotransform
    }

    pub fn crs(&self) -> &Crs {
        &self.georef.crs
    }

    pub fn nodata(&self) -> Option<f64> {
        self.bands.nodata
    }
}

/// Samples of a window plus per-pixel validity
#[derive(Debug, Clone)]
pub struct WindowRead {
    pub data: Array3<f64>,
    pub valid: Array2<bool>,
}

impl WindowRead {
    pub fn empty(window: Window, channels: usize) -> Self {
        let (rows, cols) = window.shape();
        WindowRead {
            data: Array3::zeros((rows, cols, channels)),
            valid: Array2::from_elem((rows, cols), false),
        }
    }
}

/// Strategy for reading one kind of raster
pub trait Dataset: Send {
    fn info(&self) -> &DatasetInfo;

    /// Reads `window`; pixels outside the raster are zero and invalid
    fn read(&mut self, window: Window) -> RasterResult<WindowRead>;

    /// Reads `window` with a reader that only handles in-raster windows
    fn read_clipped<F>(&mut self, window: Window, mut read_inside: F) -> RasterResult<WindowRead>
    where
        Self: Sized,
        F: FnMut(&mut Self, Window) -> RasterResult<(Array3<f64>, Array2<bool>)>,
    {
        let info = self.info();
        let mut out = WindowRead::empty(window, info.channel_count);
        let Some(inside) = info.extent().intersection(&window) else {
            return Ok(out);
        };

        let (data, valid) = read_inside(self, inside)?;
        let r0 = (inside.row_min - window.row_min) as usize;
        let c0 = (inside.col_min - window.col_min) as usize;
        let (rows, cols) = inside.shape();
        out.data.slice_mut(s![r0..r0 + rows, c0..c0 + cols, ..]).assign(&data);
        out.valid.slice_mut(s![r0..r0 + rows, c0..c0 + cols]).assign(&valid);
        Ok(out)
    }
}

/// Kind of file behind a path, decided from its leading bytes
fn is_tiff(path: &Path) -> RasterResult<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    let n = file.read(&mut magic)?;
    Ok(n == 4 && matches!(&magic, b"II*\0" | b"MM\0*" | b"II+\0" | b"MM\0+"))
}

/// Opens one file or a mosaic of several
pub fn open_dataset(paths: &[PathBuf]) -> RasterResult<Box<dyn Dataset>> {
    match paths {
        [] => Err(RasterError::InvalidConfig("a raster source needs at least one URI".to_string())),
        [path] => open_file(path),
        many => {
            let members = many.iter().map(|p| open_file(p)).collect::<RasterResult<Vec<_>>>()?;
            Ok(Box::new(Mosaic::new(members)?))
        }
    }
}

/// Header metadata of one file or a mosaic, decoding no image pixels
pub fn read_info(paths: &[PathBuf]) -> RasterResult<DatasetInfo> {
    if let [path] = paths {
        if !is_tiff(path)? {
            return ImageDataset::probe(path);
        }
    }
    Ok(open_dataset(paths)?.info().clone())
}

fn open_file(path: &Path) -> RasterResult<Box<dyn Dataset>> {
    if is_tiff(path)? {
        Ok(Box::new(TiffDataset::open(path)?))
    } else {
        Ok(Box::new(ImageDataset::open(path)?))
    }
}

/// GeoTIFF read through the native driver
pub struct TiffDataset {
    path: PathBuf,
    reader: BufReader<File>,
    byte_order: ByteOrder,
    layout: ImageLayout,
    mask_layout: Option<ImageLayout>,
    info: DatasetInfo,
}

impl TiffDataset {
    pub fn open(path: &Path) -> RasterResult<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let tiff = TiffReader::new().read(&mut reader)?;
        let main = tiff.main_ifd().ok_or(RasterError::InvalidHeader)?;

        let layout = ImageLayout::from_ifd(main)?;
        let mask_layout = tiff.mask_ifd().map(ImageLayout::from_ifd).transpose()?;
        let georef = GeoKeyParser::extract_geo_reference(main)?;
        let bands = BandMetadata::from_ifd(main, layout.samples_per_pixel)?;

        let info = DatasetInfo {
            width: layout.width,
            height: layout.height,
            channel_count: layout.samples_per_pixel,
            dtype: layout.dtype,
            georef,
            bands,
            has_mask: mask_layout.is_some(),
        };
        debug!(
            "Opened {}: {}x{}x{} {}, crs {}, mask {}",
            path.display(),
            info.width,
            info.height,
            info.channel_count,
            info.dtype,
            info.georef.crs,
            info.has_mask
        );

        Ok(TiffDataset {
            path: path.to_path_buf(),
            reader,
            byte_order: tiff.byte_order,
            layout,
            mask_layout,
            info,
        })
    }

    fn read_inside(&mut self, window: Window) -> RasterResult<(Array3<f64>, Array2<bool>)> {
        let region = window.to_region();
        let data = ChunkReader::new(&self.layout, self.byte_order)?.read_region(&mut self.reader, region)?;

        let valid = match &self.mask_layout {
            Some(mask_layout) => {
                let mask = ChunkReader::new(mask_layout, self.byte_order)?.read_region(&mut self.reader, region)?;
                mask.index_axis(Axis(2), 0).mapv(|v| v != 0.0)
            }
            None => Array2::from_elem(window.shape(), true),
        };
        Ok((data, valid))
    }
}

impl Dataset for TiffDataset {
    fn info(&self) -> &DatasetInfo {
        &self.info
    }

    fn read(&mut self, window: Window) -> RasterResult<WindowRead> {
        debug!("Reading {} from {}", window, self.path.display());
        self.read_clipped(window, Self::read_inside)
    }
}

/// Non-georeferenced image decoded with the `image` crate
pub struct ImageDataset {
    pixels: Array3<f64>,
    info: DatasetInfo,
}

fn to_array<S: Copy + Into<f64>>(width: u32, height: u32, channels: usize, raw: &[S]) -> RasterResult<Array3<f64>> {
    Array3::from_shape_vec(
        (height as usize, width as usize, channels),
        raw.iter().map(|v| (*v).into()).collect(),
    )
    .map_err(|e| RasterError::Corrupt(format!("image buffer: {}", e)))
}

fn image_info(width: u64, height: u64, channel_count: usize, dtype: DataType) -> DatasetInfo {
    let color_interp = match channel_count {
        1 => vec![ColorInterp::Gray],
        2 => vec![ColorInterp::Gray, ColorInterp::Alpha],
        3 => vec![ColorInterp::Red, ColorInterp::Green, ColorInterp::Blue],
        _ => vec![ColorInterp::Red, ColorInterp::Green, ColorInterp::Blue, ColorInterp::Alpha],
    };
    DatasetInfo {
        width,
        height,
        channel_count,
        dtype,
        georef: GeoReference::default(),
        bands: BandMetadata { nodata: None, color_interp },
        has_mask: false,
    }
}

impl ImageDataset {
    /// Header metadata of an image without decoding its pixels
    pub fn probe(path: &Path) -> RasterResult<DatasetInfo> {
        let decoder = ImageReader::open(path)?.with_guessed_format()?.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let (channel_count, dtype) = match decoder.color_type() {
            ColorType::L8 => (1, DataType::UInt8),
            ColorType::La8 => (2, DataType::UInt8),
            ColorType::Rgb8 => (3, DataType::UInt8),
            ColorType::L16 => (1, DataType::UInt16),
            ColorType::La16 => (2, DataType::UInt16),
            ColorType::Rgb16 => (3, DataType::UInt16),
            ColorType::Rgba16 => (4, DataType::UInt16),
            ColorType::Rgb32F => (3, DataType::Float32),
            ColorType::Rgba32F => (4, DataType::Float32),
            _ => (4, DataType::UInt8),
        };
        Ok(image_info(width as u64, height as u64, channel_count, dtype))
    }

    pub fn open(path: &Path) -> RasterResult<Self> {
        info!("Decoding image {}", path.display());
        let image = image::open(path)?;
        let (pixels, dtype) = match image {
            DynamicImage::ImageLuma8(b) => (to_array(b.width(), b.height(), 1, b.as_raw().as_slice())?, DataType::UInt8),
            DynamicImage::ImageLumaA8(b) => (to_array(b.width(), b.height(), 2, b.as_raw().as_slice())?, DataType::UInt8),
            DynamicImage::ImageRgb8(b) => (to_array(b.width(), b.height(), 3, b.as_raw().as_slice())?, DataType::UInt8),
            DynamicImage::ImageRgba8(b) => (to_array(b.width(), b.height(), 4, b.as_raw().as_slice())?, DataType::UInt8),
            DynamicImage::ImageLuma16(b) => (to_array(b.width(), b.height(), 1, b.as_raw().as_slice())?, DataType::UInt16),
            DynamicImage::ImageLumaA16(b) => (to_array(b.width(), b.height(), 2, b.as_raw().as_slice())?, DataType::UInt16),
            DynamicImage::ImageRgb16(b) => (to_array(b.width(), b.height(), 3, b.as_raw().as_slice())?, DataType::UInt16),
            DynamicImage::ImageRgba16(b) => (to_array(b.width(), b.height(), 4, b.as_raw().as_slice())?, DataType::UInt16),
            DynamicImage::ImageRgb32F(b) => (to_array(b.width(), b.height(), 3, b.as_raw().as_slice())?, DataType::Float32),
            DynamicImage::ImageRgba32F(b) => (to_array(b.width(), b.height(), 4, b.as_raw().as_slice())?, DataType::Float32),
            other => {
                let b = other.to_rgba8();
                (to_array(b.width(), b.height(), 4, b.as_raw().as_slice())?, DataType::UInt8)
            }
        };

        let (height, width, channel_count) = pixels.dim();
        let info = image_info(width as u64, height as u64, channel_count, dtype);
        Ok(ImageDataset { pixels, info })
    }

    fn read_inside(&mut self, window: Window) -> RasterResult<(Array3<f64>, Array2<bool>)> {
        let data = self
            .pixels
            .slice(s![
                window.row_min as usize..window.row_max as usize,
                window.col_min as usize..window.col_max as usize,
                ..
            ])
            .to_owned();
        Ok((data, Array2::from_elem(window.shape(), true)))
    }
}

impl Dataset for ImageDataset {
    fn info(&self) -> &DatasetInfo {
        &self.info
    }

    fn read(&mut self, window: Window) -> RasterResult<WindowRead> {
        self.read_clipped(window, Self::read_inside)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probed_image_header_matches_decoded_image() {
        let dir = tempfile::tempdir().unwrap();
        let gray = dir.path().join("gray.png");
        image::GrayAlphaImage::from_fn(3, 2, |x, _| image::LumaA([x as u8, 255])).save(&gray).unwrap();
        let rgb = dir.path().join("rgb16.png");
        image::ImageBuffer::<image::Rgb<u16>, Vec<u16>>::from_fn(4, 5, |x, y| image::Rgb([x as u16, y as u16, 9]))
            .save(&rgb)
            .unwrap();

        for path in [gray, rgb] {
            let probed = read_info(&[path.clone()]).unwrap();
            assert_eq!(&probed, ImageDataset::open(&path).unwrap().info());
        }
        let rgb16 = ImageDataset::probe(&dir.path().join("rgb16.png")).unwrap();
        assert_eq!((rgb16.width, rgb16.height, rgb16.channel_count), (4, 5, 3));
        assert_eq!(rgb16.dtype, DataType::UInt16);
        assert!(rgb16.georef.geotransform.is_none());
    }
}
