//! Spatial mosaic of several georeferenced files
//!
//! Members share pixel size, channel count and data type. The mosaic covers
//! the union of their footprints; later members win where they overlap and
//! areas no member covers are invalid.

use log::{info, warn};
use ndarray::Zip;

use crate::coordinate::{BoundingBox, GeoTransform, Point};
use crate::errors::{RasterError, RasterResult};
use crate::raster::dataset::{Dataset, DatasetInfo, WindowRead};
use crate::raster::mask::nodata_validity;
use crate::raster::window::Window;
use crate::tiff::geokeys::GeoReference;

/// Relative tolerance for matching pixel sizes
const PIXEL_SIZE_TOLERANCE: f64 = 1e-9;

struct Member {
    dataset: Box<dyn Dataset>,
    /// Position of the member's top-left pixel in the mosaic grid
    row_offset: i64,
    col_offset: i64,
}

pub struct Mosaic {
    members: Vec<Member>,
    info: DatasetInfo,
}

impl Mosaic {
    pub fn new(datasets: Vec<Box<dyn Dataset>>) -> RasterResult<Self> {
        let first = datasets
            .first()
            .ok_or_else(|| RasterError::IncompatibleMosaic("no members".to_string()))?
            .info()
            .clone();

        let reference = north_up_transform(&first)?;
        let (pw, ph) = (reference.pixel_width(), reference.pixel_height());

        let mut bounds: Option<BoundingBox> = None;
        for dataset in &datasets {
            let member = dataset.info();
            let gt = north_up_transform(member)?;
            let same_size = (gt.pixel_width() - pw).abs() <= PIXEL_SIZE_TOLERANCE * pw.abs()
                && (gt.pixel_height() - ph).abs() <= PIXEL_SIZE_TOLERANCE * ph.abs();
            if !same_size {
                return Err(RasterError::IncompatibleMosaic(format!(
                    "pixel size ({}, {}) differs from ({}, {})",
                    gt.pixel_width(),
                    gt.pixel_height(),
                    pw,
                    ph
                )));
            }
            if member.channel_count != first.channel_count {
                return Err(RasterError::IncompatibleMosaic(format!(
                    "{} channels, expected {}",
                    member.channel_count, first.channel_count
                )));
            }
            if member.dtype != first.dtype {
                return Err(RasterError::IncompatibleMosaic(format!(
                    "data type {}, expected {}",
                    member.dtype, first.dtype
                )));
            }
            if member.georef.crs != first.georef.crs {
                return Err(RasterError::IncompatibleMosaic(format!(
                    "CRS {} differs from {}",
                    member.georef.crs, first.georef.crs
                )));
            }
            if member.bands.nodata != first.bands.nodata {
                warn!("Mosaic members declare different nodata values, using the first");
            }

            let footprint = BoundingBox::from_points(&[
                gt.apply(0.0, 0.0),
                gt.apply(member.width as f64, member.height as f64),
            ])
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0));
            bounds = Some(match bounds {
                Some(b) => b.union(&footprint),
                None => footprint,
            });
        }

        let bounds = bounds.unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        let origin = Point::new(
            if pw > 0.0 { bounds.min_x } else { bounds.max_x },
            if ph < 0.0 { bounds.max_y } else { bounds.min_y },
        );
        let geotransform = GeoTransform::from_origin(origin.x, origin.y, pw, ph);
        let width = (bounds.width() / pw.abs()).round() as u64;
        let height = (bounds.height() / ph.abs()).round() as u64;

        let members = datasets
            .into_iter()
            .map(|dataset| {
                let member_origin = dataset.info().geotransform().map(|gt| gt.origin()).unwrap_or(origin);
                Member {
                    row_offset: ((member_origin.y - origin.y) / ph).round() as i64,
                    col_offset: ((member_origin.x - origin.x) / pw).round() as i64,
                    dataset,
                }
            })
            .collect::<Vec<_>>();

        info!("Mosaic of {} files: {}x{} pixels", members.len(), width, height);

        let info = DatasetInfo {
            width,
            height,
            channel_count: first.channel_count,
            dtype: first.dtype,
            georef: GeoReference {
                geotransform: Some(geotransform),
                crs: first.georef.crs.clone(),
            },
            bands: first.bands.clone(),
            has_mask: true,
        };
        Ok(Mosaic { members, info })
    }
}

fn north_up_transform(info: &DatasetInfo) -> RasterResult<GeoTransform> {
    match info.geotransform() {
        Some(gt) if gt.is_north_up() => Ok(gt),
        Some(_) => Err(RasterError::IncompatibleMosaic("rotated rasters cannot be mosaicked".to_string())),
        None => Err(RasterError::IncompatibleMosaic(
            "every mosaic member must be georeferenced".to_string(),
        )),
    }
}

impl Dataset for Mosaic {
    fn info(&self) -> &DatasetInfo {
        &self.info
    }

    fn read(&mut self, window: Window) -> RasterResult<WindowRead> {
        let mut out = WindowRead::empty(window, self.info.channel_count);
        for member in &mut self.members {
            let local = window.translate(-member.row_offset, -member.col_offset);
            if member.dataset.info().extent().intersection(&local).is_none() {
                continue;
            }

            let read = member.dataset.read(local)?;
            let mut valid = read.valid;
            if let Some(nodata) = member.dataset.info().nodata() {
                Zip::from(&mut valid).and(&nodata_validity(&read.data, nodata)).for_each(|v, n| *v &= *n);
            }

            Zip::from(out.data.lanes_mut(ndarray::Axis(2)))
                .and(&mut out.valid)
                .and(read.data.lanes(ndarray::Axis(2)))
                .and(&valid)
                .for_each(|mut dst, dst_valid, src, src_valid| {
                    if *src_valid {
                        dst.assign(&src);
                        *dst_valid = true;
                    }
                });
        }
        Ok(out)
    }
}
