//! Tests for GeoTIFF writing, georeferencing and band metadata

use std::io::Cursor;

use ndarray::{Array2, Array3};

use crate::coordinate::{Crs, GeoTransform};
use crate::io::byte_order::ByteOrder;
use crate::raster::dtype::DataType;
use crate::tiff::chunk_reader::ChunkReader;
use crate::tiff::geokeys::GeoKeyParser;
use crate::tiff::layout::ImageLayout;
use crate::tiff::metadata::{BandMetadata, ColorInterp};
use crate::tiff::reader::TiffReader;
use crate::tiff::region::Region;
use crate::tiff::types::TIFF;
use crate::tiff::writer::GeoTiffWriter;
use super::test_utils::gradient;

fn read_back(bytes: Vec<u8>) -> (TIFF, Array3<f64>) {
    let mut cursor = Cursor::new(bytes);
    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    let layout = ImageLayout::from_ifd(tiff.main_ifd().unwrap()).unwrap();
    let region = Region::new(0, 0, layout.width, layout.height);
    let data = ChunkReader::new(&layout, tiff.byte_order)
        .unwrap()
        .read_region(&mut cursor, region)
        .unwrap();
    (tiff, data)
}

#[test]
fn test_tiled_planar_big_endian_deflate() {
    let data = gradient(37, 45, 3);
    let bytes = GeoTiffWriter::new()
        .byte_order(ByteOrder::BigEndian)
        .compression("deflate")
        .unwrap()
        .predictor(true)
        .tiled(16)
        .planar(true)
        .encode(&data, DataType::UInt16)
        .unwrap();

    let (tiff, decoded) = read_back(bytes);
    let layout = ImageLayout::from_ifd(tiff.main_ifd().unwrap()).unwrap();
    assert!(layout.tiled);
    assert!(layout.planar);
    assert_eq!(layout.predictor, 2);
    assert_eq!(decoded, data);
}

#[test]
fn test_bigtiff_lzw_float_strips() {
    let data = gradient(20, 9, 2).mapv(|v| v * 0.5 - 3.0);
    let bytes = GeoTiffWriter::new()
        .big_tiff(true)
        .compression("lzw")
        .unwrap()
        .rows_per_strip(7)
        .encode(&data, DataType::Float32)
        .unwrap();

    let (tiff, decoded) = read_back(bytes);
    assert!(tiff.is_big_tiff);
    assert_eq!(decoded, data);
}

#[test]
fn test_window_across_tile_boundary() {
    let data = gradient(40, 40, 1);
    let bytes = GeoTiffWriter::new()
        .compression("zstd")
        .unwrap()
        .tiled(16)
        .encode(&data, DataType::Int32)
        .unwrap();

    let mut cursor = Cursor::new(bytes);
    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    let layout = ImageLayout::from_ifd(tiff.main_ifd().unwrap()).unwrap();
    let window = ChunkReader::new(&layout, tiff.byte_order)
        .unwrap()
        .read_region(&mut cursor, Region::new(10, 12, 20, 9))
        .unwrap();

    assert_eq!(window.dim(), (9, 20, 1));
    assert_eq!(window[[0, 0, 0]], data[[12, 10, 0]]);
    assert_eq!(window[[8, 19, 0]], data[[20, 29, 0]]);
}

#[test]
fn test_north_up_georeferencing() {
    let gt = GeoTransform::from_origin(500_000.0, 4_600_000.0, 10.0, -10.0);
    let bytes = GeoTiffWriter::new()
        .geotransform(gt)
        .crs(Crs::Epsg(32633))
        .encode(&gradient(4, 4, 1), DataType::UInt8)
        .unwrap();

    let (tiff, _) = read_back(bytes);
    let georef = GeoKeyParser::extract_geo_reference(tiff.main_ifd().unwrap()).unwrap();
    assert_eq!(georef.crs, Crs::Epsg(32633));
    assert_eq!(georef.geotransform, Some(gt));
}

#[test]
fn test_rotated_transform_and_geographic_crs() {
    let gt = GeoTransform::new([4.0, 0.001, 0.0002, 51.0, 0.0001, -0.001]);
    let bytes = GeoTiffWriter::new()
        .geotransform(gt)
        .crs(Crs::Epsg(4326))
        .encode(&gradient(3, 3, 1), DataType::UInt8)
        .unwrap();

    let (tiff, _) = read_back(bytes);
    let georef = GeoKeyParser::extract_geo_reference(tiff.main_ifd().unwrap()).unwrap();
    assert_eq!(georef.crs, Crs::Epsg(4326));
    assert_eq!(georef.geotransform, Some(gt));
}

#[test]
fn test_user_defined_crs_is_unidentified() {
    let bytes = GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(0.0, 0.0, 1.0, -1.0))
        .crs(Crs::Unidentified("Custom LCC".to_string()))
        .encode(&gradient(2, 2, 1), DataType::UInt8)
        .unwrap();

    let (tiff, _) = read_back(bytes);
    let georef = GeoKeyParser::extract_geo_reference(tiff.main_ifd().unwrap()).unwrap();
    assert_eq!(georef.crs, Crs::Unidentified("Custom LCC".to_string()));
    assert!(georef.geotransform.is_some());
}

#[test]
fn test_plain_tiff_has_no_georeferencing() {
    let bytes = GeoTiffWriter::new().encode(&gradient(2, 2, 1), DataType::UInt8).unwrap();

    let (tiff, _) = read_back(bytes);
    let georef = GeoKeyParser::extract_geo_reference(tiff.main_ifd().unwrap()).unwrap();
    assert_eq!(georef.crs, Crs::None);
    assert!(georef.geotransform.is_none());
}

#[test]
fn test_nodata_and_alpha_metadata() {
    let bytes = GeoTiffWriter::new()
        .nodata(1.0)
        .color_interp(1, ColorInterp::Alpha)
        .encode(&gradient(3, 3, 3), DataType::UInt16)
        .unwrap();

    let (tiff, _) = read_back(bytes);
    let metadata = BandMetadata::from_ifd(tiff.main_ifd().unwrap(), 3).unwrap();
    assert_eq!(metadata.nodata, Some(1.0));
    assert_eq!(metadata.alpha_band(), Some(1));
}

#[test]
fn test_rgba_extra_sample_alpha() {
    let bytes = GeoTiffWriter::new()
        .alpha_band(3)
        .encode(&gradient(2, 2, 4), DataType::UInt8)
        .unwrap();

    let (tiff, _) = read_back(bytes);
    let metadata = BandMetadata::from_ifd(tiff.main_ifd().unwrap(), 4).unwrap();
    assert_eq!(
        metadata.color_interp,
        vec![ColorInterp::Red, ColorInterp::Green, ColorInterp::Blue, ColorInterp::Alpha]
    );
    assert_eq!(metadata.nodata, None);
}

#[test]
fn test_internal_mask_ifd() {
    let mask = Array2::from_shape_fn((5, 11), |(r, c)| (r + c) % 3 != 0);
    let bytes = GeoTiffWriter::new()
        .compression("packbits")
        .unwrap()
        .mask(mask.clone())
        .encode(&gradient(5, 11, 1), DataType::UInt8)
        .unwrap();

    let mut cursor = Cursor::new(bytes);
    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    let mask_ifd = tiff.mask_ifd().unwrap();
    let layout = ImageLayout::from_ifd(mask_ifd).unwrap();
    assert_eq!(layout.bits_per_sample, 1);

    let decoded = ChunkReader::new(&layout, tiff.byte_order)
        .unwrap()
        .read_region(&mut cursor, Region::new(0, 0, 11, 5))
        .unwrap();
    for ((r, c), valid) in mask.indexed_iter() {
        assert_eq!(decoded[[r, c, 0]] == 1.0, *valid);
    }
}
