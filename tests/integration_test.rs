//! Integration tests for raster sources, statistics and pipelines

use std::fs::File;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{s, Array2, Array3, Axis};
use tempfile::TempDir;

use chipkit::config::{BuildConfig, PipelineConfig, RasterSourceConfig, RasterStatsConfig, ScratchDir, StatsTransformerConfig};
use chipkit::coordinate::{Crs, GeoTransform, Point};
use chipkit::errors::{RasterError, RasterResult};
use chipkit::raster::{DataType, RasterSource, Window};
use chipkit::stats::{RasterStats, SamplePolicy};
use chipkit::tiff::GeoTiffWriter;
use chipkit::transform::StatsMode;

fn ramp(rows: usize, cols: usize, bands: usize) -> Array3<f64> {
    Array3::from_shape_fn((rows, cols, bands), |(r, c, b)| (10 + r * cols + c + 100 * b) as f64)
}

fn utm_writer() -> GeoTiffWriter {
    GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(300_000.0, 5_000_000.0, 10.0, -10.0))
        .crs(Crs::Epsg(32633))
}

fn write_tif(dir: &TempDir, name: &str, writer: GeoTiffWriter, data: &Array3<f64>, dtype: DataType) -> PathBuf {
    let path = dir.path().join(name);
    writer.write(&path, data, dtype).unwrap();
    path
}

fn uri(path: &Path) -> String {
    path.display().to_string()
}

fn build(config: RasterSourceConfig) -> RasterResult<RasterSource> {
    let scratch = ScratchDir::temporary()?;
    config.build(&scratch)
}

#[test]
fn test_nodata_in_any_channel_zeroes_the_pixel() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = ramp(8, 8, 3);
    data[[2, 3, 1]] = 1.0;
    let path = write_tif(&dir, "nodata.tif", utm_writer().nodata(1.0), &data, DataType::UInt16);

    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    assert_eq!(source.nodata_value(), Some(1.0));
    let chip = source.with_activated(|s| s.get_image_array()).unwrap();

    assert_eq!(chip.shape(), (8, 8, 3));
    assert!(chip.data.slice(s![2, 3, ..]).iter().all(|v| *v == 0.0));
    assert_eq!(chip.data[[2, 4, 0]], data[[2, 4, 0]]);
    assert_eq!(chip.sum(), data.sum() - data.slice(s![2, 3, ..]).sum());
}

#[test]
fn test_all_false_mask_zeroes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp(16, 16, 2);
    let writer = utm_writer().mask(Array2::from_elem((16, 16), false));
    let path = write_tif(&dir, "masked.tif", writer, &data, DataType::UInt16);

    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    let chip = source.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.shape(), (16, 16, 2));
    assert_eq!(chip.sum(), 0.0);
}

#[test]
fn test_partial_mask_zeroes_invalid_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp(16, 16, 1);
    let mut mask = Array2::from_elem((16, 16), true);
    mask[[0, 0]] = false;
    mask[[15, 9]] = false;
    let path = write_tif(&dir, "partial.tif", utm_writer().mask(mask), &data, DataType::UInt16);

    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    let chip = source.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.data[[0, 0, 0]], 0.0);
    assert_eq!(chip.data[[15, 9, 0]], 0.0);
    assert_eq!(chip.sum(), data.sum() - data[[0, 0, 0]] - data[[15, 9, 0]]);
}

#[test]
fn test_channel_order_selects_and_reorders() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp(6, 5, 3);
    let path = write_tif(&dir, "rgb.tif", utm_writer(), &data, DataType::UInt16);

    let mut source = build(RasterSourceConfig::new([uri(&path)]).with_channel_order(vec![2, 0])).unwrap();
    assert_eq!(source.num_channels(), 2);
    let chip = source.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.data.index_axis(Axis(2), 0), data.index_axis(Axis(2), 2));
    assert_eq!(chip.data.index_axis(Axis(2), 1), data.index_axis(Axis(2), 0));

    let err = build(RasterSourceConfig::new([uri(&path)]).with_channel_order(vec![0, 3])).unwrap_err();
    assert!(matches!(err, RasterError::ChannelOrder { index: 3, channel_count: 3 }));
    assert!(err.is_configuration());
}

#[test]
fn test_alpha_band_is_excluded_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = Array3::from_shape_fn((4, 4, 4), |(r, c, b)| (r * 4 + c + 40 * b) as f64);
    data.index_axis_mut(Axis(2), 3).fill(255.0);
    let path = write_tif(&dir, "rgba.tif", utm_writer().alpha_band(3), &data, DataType::UInt8);

    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    assert_eq!(source.raw_channel_count(), 4);
    assert_eq!(source.channel_order(), &[0, 1, 2]);
    let chip = source.with_activated(|s| s.get_chip(Window::new(0, 0, 2, 2)?)).unwrap();
    assert_eq!(chip.num_channels(), 3);
}

#[test]
fn test_non_georeferenced_image_uses_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.png");
    image::RgbImage::from_fn(5, 4, |x, y| image::Rgb([x as u8 + 1, y as u8 + 1, 7]))
        .save(&path)
        .unwrap();

    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    let transformer = source.get_crs_transformer().clone();
    assert!(!transformer.is_georeferenced());
    assert_eq!(transformer.crs(), &Crs::None);
    for p in [Point::new(12.5, -3.25), Point::new(0.1, 1e9), Point::new(0.0, 0.0)] {
        assert_eq!(transformer.map_to_pixel(p), p);
        assert_eq!(transformer.pixel_to_map(p), p);
    }

    let chip = source.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.shape(), (4, 5, 3));
    assert_eq!(chip.dtype, DataType::UInt8);
    assert_eq!(chip.data[[3, 2, 0]], 3.0);
    assert_eq!(chip.data[[3, 2, 1]], 4.0);
}

#[test]
fn test_shift_vacates_edge_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let ones = Array3::from_elem((256, 256, 1), 1.0);
    let writer = GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(0.0, 256.0, 1.0, -1.0))
        .crs(Crs::Epsg(32633));
    let path = write_tif(&dir, "ones.tif", writer, &ones, DataType::UInt8);

    let mut plain = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    let full = plain.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(full.sum(), 65536.0);

    let mut x_shifted = build(RasterSourceConfig::new([uri(&path)]).with_shift(1.0, 0.0)).unwrap();
    let chip = x_shifted.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.sum(), 65536.0 - 256.0);
    assert_eq!(chip.data.slice(s![.., 255, 0]).sum(), 0.0);
    assert_eq!(chip.data.slice(s![.., 0, 0]).sum(), 256.0);

    let mut y_shifted = build(RasterSourceConfig::new([uri(&path)]).with_shift(0.0, 1.0)).unwrap();
    let chip = y_shifted.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.sum(), 65536.0 - 256.0);
    assert_eq!(chip.data.slice(s![0, .., 0]).sum(), 0.0);
    assert_eq!(chip.data.slice(s![255, .., 0]).sum(), 256.0);
}

fn stats_source(dir: &TempDir, mode: StatsMode, x_shift: f64) -> RasterSource {
    let mut data = ramp(8, 8, 1);
    data[[2, 3, 0]] = 7.0;
    let writer = GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(0.0, 8.0, 1.0, -1.0))
        .crs(Crs::Epsg(32633))
        .nodata(7.0);
    let path = write_tif(dir, "nodata7.tif", writer, &data, DataType::UInt16);
    let stats_path = dir.path().join("flat.json");
    RasterStats::new(vec![100.0], vec![50.0]).unwrap().save(&uri(&stats_path)).unwrap();

    let transformer = StatsTransformerConfig::new(uri(&stats_path)).with_mode(mode);
    build(
        RasterSourceConfig::new([uri(&path)])
            .with_shift(x_shift, 0.0)
            .with_transformer(transformer),
    )
    .unwrap()
}

#[test]
fn test_transformed_chips_keep_invalid_pixels_zero() {
    for mode in [StatsMode::UInt8, StatsMode::ZScore] {
        let dir = tempfile::tempdir().unwrap();

        let mut source = stats_source(&dir, mode, 0.0);
        let (full, outside) = source
            .with_activated(|s| Ok((s.get_image_array()?, s.get_chip(Window::new(100, 100, 102, 102)?)?)))
            .unwrap();
        assert_eq!(full.data[[2, 3, 0]], 0.0, "{:?}", mode);
        assert_eq!(full.data.iter().filter(|v| **v == 0.0).count(), 1, "{:?}", mode);
        assert_eq!(outside.shape(), (2, 2, 1));
        assert_eq!(outside.sum(), 0.0, "{:?}", mode);

        let mut shifted = stats_source(&dir, mode, 1.0);
        let chip = shifted.with_activated(|s| s.get_image_array()).unwrap();
        assert!(chip.data.slice(s![.., 7, 0]).iter().all(|v| *v == 0.0), "{:?}", mode);
        assert!(chip.data.slice(s![.., 0, 0]).iter().all(|v| *v != 0.0), "{:?}", mode);
    }
}

fn noisy_source(dir: &TempDir) -> PathBuf {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(42);
    let data = Array3::from_shape_fn((64, 48, 3), |(_, _, b)| rng.gen_range(1..4000) as f64 * (b + 1) as f64);
    write_tif(dir, "noisy.tif", utm_writer().tiled(16).compression("lzw").unwrap(), &data, DataType::UInt16)
}

#[test]
fn test_zscore_normalizes_own_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = noisy_source(&dir);
    let stats_path = dir.path().join("stats.json");

    let analyzer = RasterStatsConfig {
        output_uri: uri(&stats_path),
        sample: SamplePolicy { chip_size: 20, ..Default::default() },
    }
    .build(&ScratchDir::at(dir.path()))
    .unwrap();
    let mut sources = vec![build(RasterSourceConfig::new([uri(&path)])).unwrap()];
    let stats = analyzer.run(&mut sources).unwrap();
    assert_eq!(stats.channel_count(), 3);

    let transformer = StatsTransformerConfig::new(uri(&stats_path)).with_mode(StatsMode::ZScore);
    let mut source = build(RasterSourceConfig::new([uri(&path)]).with_transformer(transformer)).unwrap();
    let chip = source.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.dtype, DataType::Float32);

    for lane in chip.data.axis_iter(Axis(2)) {
        let n = lane.len() as f64;
        let mean = lane.sum() / n;
        let std = (lane.mapv(|v| (v - mean).powi(2)).sum() / n).sqrt();
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(std, 1.0, epsilon = 1e-4);
    }
}

#[test]
fn test_uint8_stretch_stays_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = noisy_source(&dir);
    let stats_path = dir.path().join("stats.json");

    let mut sources = vec![build(RasterSourceConfig::new([uri(&path)])).unwrap()];
    RasterStats::compute(&mut sources, &SamplePolicy::default())
        .unwrap()
        .save(&uri(&stats_path))
        .unwrap();

    let transformer = StatsTransformerConfig::new(uri(&stats_path));
    let mut source = build(
        RasterSourceConfig::new([uri(&path)])
            .with_channel_order(vec![0, 1])
            .with_transformer(transformer),
    )
    .unwrap();

    let chip = source
        .with_activated(|s| {
            let raw = s.get_raw_image_array(None)?;
            assert_eq!(raw.num_channels(), 3);
            s.get_image_array()
        })
        .unwrap();
    assert_eq!(chip.dtype, DataType::UInt8);
    assert_eq!(chip.num_channels(), 2);
    assert!(chip.data.iter().all(|v| (0.0..=255.0).contains(v) && v.fract() == 0.0));
    assert!(chip.data.iter().any(|v| *v > 100.0));
}

#[test]
fn test_stats_with_too_few_channels_fail_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = noisy_source(&dir);
    let stats_path = dir.path().join("two.json");
    RasterStats::new(vec![1.0, 2.0], vec![1.0, 1.0]).unwrap().save(&uri(&stats_path)).unwrap();

    let err = build(RasterSourceConfig::new([uri(&path)]).with_transformer(StatsTransformerConfig::new(uri(&stats_path))))
        .unwrap_err();
    assert!(matches!(err, RasterError::StatsChannelMismatch { index: 2, stats_channels: 2 }));
}

#[test]
fn test_stats_with_too_many_channels_fail_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = noisy_source(&dir);
    let stats_path = dir.path().join("four.json");
    RasterStats::new(vec![1.0; 4], vec![1.0; 4]).unwrap().save(&uri(&stats_path)).unwrap();

    let config = RasterSourceConfig::new([uri(&path)])
        .with_channel_order(vec![0, 1, 2])
        .with_transformer(StatsTransformerConfig::new(uri(&stats_path)));
    let err = build(config).unwrap_err();
    assert!(matches!(err, RasterError::StatsChannelCount { stats_channels: 4, raw_channels: 3 }));
    assert!(err.is_configuration());
}

#[test]
fn test_computed_stats_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = noisy_source(&dir);
    let mut sources = vec![build(RasterSourceConfig::new([uri(&path)])).unwrap()];
    let policy = SamplePolicy { chip_size: 16, sample_prob: Some(0.5), seed: 3, ..Default::default() };
    let stats = RasterStats::compute(&mut sources, &policy).unwrap();

    let stats_uri = uri(&dir.path().join("out/stats.json"));
    stats.save(&stats_uri).unwrap();
    let loaded = RasterStats::load(&stats_uri).unwrap();
    assert_eq!(loaded.means, stats.means);
    assert_eq!(loaded.stds, stats.stds);
    assert!(!sources[0].is_active());
}

#[test]
fn test_stats_reject_sources_with_different_channel_counts() {
    let dir = tempfile::tempdir().unwrap();
    let three = write_tif(&dir, "three.tif", utm_writer(), &ramp(8, 8, 3), DataType::UInt16);
    let two = write_tif(&dir, "two.tif", utm_writer(), &ramp(8, 8, 2), DataType::UInt16);
    let mut sources = vec![
        build(RasterSourceConfig::new([uri(&three)])).unwrap(),
        build(RasterSourceConfig::new([uri(&two)])).unwrap(),
    ];
    let err = RasterStats::compute(&mut sources, &SamplePolicy::default()).unwrap_err();
    assert!(matches!(err, RasterError::SourceChannelMismatch { expected: 3, found: 2, .. }));
}

#[test]
fn test_unidentified_crs_builds_and_reads() {
    let dir = tempfile::tempdir().unwrap();
    let writer = GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(1000.0, 2000.0, 0.5, -0.5))
        .crs(Crs::Unidentified("Local site grid".to_string()));
    let path = write_tif(&dir, "local.tif", writer, &ramp(8, 8, 1), DataType::Int16);

    let mut config = RasterSourceConfig::new([uri(&path)]);
    config.map_crs = Some(3857);
    let mut source = build(config).unwrap();
    let transformer = source.get_crs_transformer();
    assert_eq!(transformer.crs(), &Crs::Unidentified("Local site grid".to_string()));
    assert_eq!(transformer.pixel_to_map(Point::new(2.0, 4.0)), Point::new(1001.0, 1998.0));

    let chip = source.with_activated(|s| s.get_chip(Window::new(0, 0, 4, 4)?)).unwrap();
    assert_eq!(chip.data[[1, 1, 0]], 19.0);
}

#[test]
fn test_map_crs_reprojects_geographic_rasters() {
    let dir = tempfile::tempdir().unwrap();
    let writer = GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(10.0, 50.0, 0.01, -0.01))
        .crs(Crs::Epsg(4326));
    let path = write_tif(&dir, "wgs84.tif", writer, &ramp(4, 4, 1), DataType::UInt16);

    let mut config = RasterSourceConfig::new([uri(&path)]);
    config.map_crs = Some(3857);
    let source = build(config).unwrap();
    let transformer = source.get_crs_transformer();
    let map = transformer.pixel_to_map(Point::new(1.0, 2.0));
    assert!(map.x > 1_000_000.0);
    let back = transformer.map_to_pixel(map);
    assert_abs_diff_eq!(back.x, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(back.y, 2.0, epsilon = 1e-6);

    let mut bad = RasterSourceConfig::new([uri(&path)]);
    bad.map_crs = Some(32633);
    assert!(matches!(build(bad), Err(RasterError::UnsupportedReprojection { from: 4326, to: 32633 })));
}

#[test]
fn test_dtype_is_known_before_activation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tif(&dir, "f32.tif", utm_writer(), &ramp(4, 4, 2), DataType::Float32);
    let source = build(RasterSourceConfig::new([uri(&path)])).unwrap();
    assert!(!source.is_active());
    assert_eq!(source.get_dtype(), DataType::Float32);
}

#[test]
fn test_reads_require_activation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tif(&dir, "a.tif", utm_writer(), &ramp(4, 4, 1), DataType::UInt16);
    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();

    assert!(matches!(source.get_extent(), Err(RasterError::NotActivated)));
    assert!(matches!(source.get_image_array(), Err(RasterError::NotActivated)));
    let window = Window::new(0, 0, 2, 2).unwrap();
    assert!(matches!(source.get_chip(window), Err(RasterError::NotActivated)));
    assert!(matches!(source.get_raw_image_array(Some(window)), Err(RasterError::NotActivated)));
}

#[test]
fn test_guard_closes_on_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tif(&dir, "a.tif", utm_writer(), &ramp(4, 4, 1), DataType::UInt16);
    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = source.activate().unwrap();
        panic!("reader failed");
    }));
    assert!(result.is_err());
    assert!(!source.is_active());
}

#[test]
fn test_window_outside_raster_reads_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tif(&dir, "a.tif", utm_writer(), &ramp(8, 8, 2), DataType::UInt16);
    let mut source = build(RasterSourceConfig::new([uri(&path)])).unwrap();

    let (outside, straddling) = source
        .with_activated(|s| {
            let outside = s.get_chip(Window::new(100, -50, 110, -40)?)?;
            let straddling = s.get_chip(Window::new(-2, 6, 2, 10)?)?;
            Ok((outside, straddling))
        })
        .unwrap();
    assert_eq!(outside.shape(), (10, 10, 2));
    assert_eq!(outside.sum(), 0.0);

    assert_eq!(straddling.shape(), (4, 4, 2));
    assert_eq!(straddling.data[[2, 0, 0]], 16.0);
    assert_eq!(straddling.data.slice(s![0..2, .., ..]).sum(), 0.0);
    assert_eq!(straddling.data.slice(s![.., 2..4, ..]).sum(), 0.0);
}

#[test]
fn test_mosaic_of_adjacent_files() {
    let dir = tempfile::tempdir().unwrap();
    let left = Array3::from_elem((4, 4, 1), 5.0);
    let right = Array3::from_elem((4, 4, 1), 9.0);
    let at = |x: f64| {
        GeoTiffWriter::new()
            .geotransform(GeoTransform::from_origin(x, 40.0, 10.0, -10.0))
            .crs(Crs::Epsg(32633))
    };
    let a = write_tif(&dir, "left.tif", at(0.0), &left, DataType::UInt16);
    let b = write_tif(&dir, "right.tif", at(60.0), &right, DataType::UInt16);
    let c = write_tif(&dir, "overlap.tif", at(20.0), &Array3::from_elem((2, 2, 1), 7.0), DataType::UInt16);

    let mut source = build(RasterSourceConfig::new([uri(&a), uri(&b), uri(&c)])).unwrap();
    let chip = source
        .with_activated(|s| {
            assert_eq!(s.get_extent()?, Window::new(0, 0, 4, 10)?);
            s.get_image_array()
        })
        .unwrap();

    assert_eq!(chip.data[[3, 0, 0]], 5.0);
    assert_eq!(chip.data[[0, 2, 0]], 7.0);
    assert_eq!(chip.data[[3, 3, 0]], 5.0);
    assert_eq!(chip.data.slice(s![.., 4..6, ..]).sum(), 0.0);
    assert_eq!(chip.data.slice(s![.., 6..10, ..]).sum(), 9.0 * 16.0);
    assert_eq!(source.get_crs_transformer().pixel_to_map(Point::new(0.0, 0.0)), Point::new(0.0, 40.0));
}

#[test]
fn test_mosaic_rejects_mismatched_pixel_size() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_tif(&dir, "a.tif", utm_writer(), &ramp(4, 4, 1), DataType::UInt16);
    let coarse = GeoTiffWriter::new()
        .geotransform(GeoTransform::from_origin(300_000.0, 5_000_000.0, 20.0, -20.0))
        .crs(Crs::Epsg(32633));
    let b = write_tif(&dir, "b.tif", coarse, &ramp(4, 4, 1), DataType::UInt16);

    let err = build(RasterSourceConfig::new([uri(&a), uri(&b)])).unwrap_err();
    assert!(matches!(err, RasterError::IncompatibleMosaic(_)));
    assert!(err.is_configuration());
}

#[test]
fn test_gzipped_uri_is_decompressed_into_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp(8, 8, 1);
    let path = write_tif(&dir, "scene.tif", utm_writer(), &data, DataType::UInt16);
    let gz = dir.path().join("scene.tif.gz");
    let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
    encoder.write_all(&std::fs::read(&path).unwrap()).unwrap();
    encoder.finish().unwrap();

    let scratch = ScratchDir::temporary().unwrap();
    let mut source = RasterSourceConfig::new([format!("file://{}", gz.display())]).build(&scratch).unwrap();
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 1);
    let chip = source.with_activated(|s| s.get_image_array()).unwrap();
    assert_eq!(chip.data, data);

    let remote = RasterSourceConfig::new(["s3://bucket/scene.tif"]).build(&scratch).unwrap_err();
    assert!(matches!(remote, RasterError::UnsupportedUri(_)));
}

fn gzip_into(dir: &Path, data: &Array3<f64>) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let tif = dir.join("scene.tif");
    utm_writer().write(&tif, data, DataType::UInt8).unwrap();
    let gz = dir.join("scene.tif.gz");
    let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
    encoder.write_all(&std::fs::read(&tif).unwrap()).unwrap();
    encoder.finish().unwrap();
    gz
}

#[test]
fn test_gzipped_uris_with_the_same_name_stay_apart() {
    let dir = tempfile::tempdir().unwrap();
    let a = gzip_into(&dir.path().join("a"), &Array3::from_elem((4, 4, 1), 5.0));
    let b = gzip_into(&dir.path().join("b"), &Array3::from_elem((4, 4, 1), 9.0));

    let scratch = ScratchDir::temporary().unwrap();
    let mut first = RasterSourceConfig::new([uri(&a)]).build(&scratch).unwrap();
    let mut second = RasterSourceConfig::new([uri(&b)]).build(&scratch).unwrap();
    let first = first.with_activated(|s| s.get_image_array()).unwrap();
    let second = second.with_activated(|s| s.get_image_array()).unwrap();
    assert!(first.data.iter().all(|v| *v == 5.0));
    assert!(second.data.iter().all(|v| *v == 9.0));
}

#[test]
fn test_pipeline_file_builds_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tif(&dir, "scene.tif", utm_writer(), &ramp(8, 8, 3), DataType::UInt16);
    let pipeline_path = dir.path().join("pipeline.toml");
    std::fs::write(
        &pipeline_path,
        format!(
            "[[sources]]\nuris = [\"{}\"]\nchannel_order = [1]\nwindow_policy = \"clamp\"\n\n[stats]\noutput_uri = \"{}\"\n",
            uri(&path),
            uri(&dir.path().join("stats.json"))
        ),
    )
    .unwrap();

    let pipeline = PipelineConfig::from_file(&pipeline_path).unwrap();
    let scratch = ScratchDir::temporary().unwrap();
    let mut sources = pipeline.build_sources(&scratch).unwrap();
    assert_eq!(sources.len(), 1);

    let chip = sources[0].with_activated(|s| s.get_chip(Window::new(6, 6, 10, 10)?)).unwrap();
    assert_eq!(chip.shape(), (2, 2, 1));
    assert_eq!(chip.data[[0, 0, 0]], (10 + 6 * 8 + 6 + 100) as f64);

    let analyzer = pipeline.stats.unwrap().build(&scratch).unwrap();
    let stats = analyzer.run(&mut sources).unwrap();
    assert_eq!(RasterStats::load(analyzer.output_uri()).unwrap(), stats);
}
