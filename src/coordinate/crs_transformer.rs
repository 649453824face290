//! Pixel to map coordinate conversion for a single raster
//!
//! A [`CrsTransformer`] combines the raster's affine geotransform with an
//! optional reprojection into a requested map CRS. Rasters without a
//! geotransform get the identity, which leaves points untouched bit for bit.

use log::warn;

use super::crs::{CoordinateSystem, Crs};
use super::geotransform::GeoTransform;
use super::point::Point;
use super::transform::CoordinateTransformer;
use crate::errors::{RasterError, RasterResult};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Reprojection {
    Wgs84ToWebMercator,
    WebMercatorToWgs84,
}

impl Reprojection {
    fn between(from: CoordinateSystem, to: CoordinateSystem) -> Option<Self> {
        match (from, to) {
            (CoordinateSystem::WGS84, CoordinateSystem::WebMercator) => Some(Reprojection::Wgs84ToWebMercator),
            (CoordinateSystem::WebMercator, CoordinateSystem::WGS84) => Some(Reprojection::WebMercatorToWgs84),
            _ => None,
        }
    }

    fn forward(&self, p: Point) -> Point {
        let t = CoordinateTransformer;
        match self {
            Reprojection::Wgs84ToWebMercator => t.wgs84_to_web_mercator(p.x, p.y),
            Reprojection::WebMercatorToWgs84 => t.web_mercator_to_wgs84(p.x, p.y),
        }
    }

    fn backward(&self, p: Point) -> Point {
        let t = CoordinateTransformer;
        match self {
            Reprojection::Wgs84ToWebMercator => t.web_mercator_to_wgs84(p.x, p.y),
            Reprojection::WebMercatorToWgs84 => t.wgs84_to_web_mercator(p.x, p.y),
        }
    }
}

/// Converts between pixel `(x = col, y = row)` and map `(x, y)` coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CrsTransformer {
    geotransform: Option<GeoTransform>,
    inverse: Option<GeoTransform>,
    crs: Crs,
    reprojection: Option<Reprojection>,
}

impl CrsTransformer {
    /// Transformer for a raster with no georeferencing
    pub fn identity() -> Self {
        CrsTransformer {
            geotransform: None,
            inverse: None,
            crs: Crs::None,
            reprojection: None,
        }
    }

    /// Builds a transformer for a raster
    ///
    /// # Arguments
    /// * `geotransform` - Affine transform of the raster, if any
    /// * `crs` - Native CRS of the raster
    /// * `map_crs` - EPSG code of the CRS map points should be expressed in
    ///
    /// # Returns
    /// The transformer, or `UnsupportedReprojection` if `crs` and `map_crs`
    /// are both known but no conversion exists between them
    pub fn new(geotransform: Option<GeoTransform>, crs: Crs, map_crs: Option<u32>) -> RasterResult<Self> {
        let Some(geotransform) = geotransform else {
            if map_crs.is_some() {
                warn!("Raster is not georeferenced, ignoring map CRS request");
            }
            return Ok(Self::identity());
        };

        let inverse = geotransform.invert()?;
        let reprojection = match (map_crs, &crs) {
            (None, _) => None,
            (Some(target), Crs::Epsg(native)) if target == *native => None,
            (Some(target), Crs::Epsg(native)) => {
                let from = CoordinateSystem::from_epsg(*native);
                let to = CoordinateSystem::from_epsg(target);
                if from == to {
                    None
                } else {
                    let reprojection = Reprojection::between(from, to)
                        .ok_or(RasterError::UnsupportedReprojection { from: *native, to: target })?;
                    Some(reprojection)
                }
            }
            (Some(target), other) => {
                warn!("Raster CRS is {}, cannot reproject to EPSG:{}; using raster coordinates", other, target);
                None
            }
        };

        Ok(CrsTransformer {
            geotransform: Some(geotransform),
            inverse: Some(inverse),
            crs,
            reprojection,
        })
    }

    /// Converts a pixel point to map coordinates
    pub fn pixel_to_map(&self, pixel: Point) -> Point {
        let Some(gt) = &self.geotransform else {
            return pixel;
        };
        let native = gt.apply(pixel.x, pixel.y);
        match &self.reprojection {
            Some(reprojection) => reprojection.forward(native),
            None => native,
        }
    }

    /// Converts a map point to (fractional) pixel coordinates
    pub fn map_to_pixel(&self, map: Point) -> Point {
        let Some(inv) = &self.inverse else {
            return map;
        };
        let native = match &self.reprojection {
            Some(reprojection) => reprojection.backward(map),
            None => map,
        };
        inv.apply(native.x, native.y)
    }

    /// Pixel width and height in native map units; `(1, 1)` without georeferencing
    pub fn pixel_size(&self) -> (f64, f64) {
        match &self.geotransform {
            Some(gt) => (gt.pixel_width(), gt.pixel_height()),
            None => (1.0, 1.0),
        }
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn geotransform(&self) -> Option<&GeoTransform> {
        self.geotransform.as_ref()
    }

    pub fn is_georeferenced(&self) -> bool {
        self.geotransform.is_some()
    }
}
