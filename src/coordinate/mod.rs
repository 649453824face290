//! Coordinate handling for geospatial rasters
//!
//! Points, map-space footprints, affine geotransforms, CRS identity and the
//! per-raster [`CrsTransformer`].

mod bbox;
mod crs;
mod crs_transformer;
mod geotransform;
mod point;
mod transform;

pub use self::bbox::BoundingBox;
pub use self::crs::{CoordinateSystem, Crs};
pub use self::crs_transformer::CrsTransformer;
pub use self::geotransform::GeoTransform;
pub use self::point::Point;
pub use self::transform::CoordinateTransformer;
