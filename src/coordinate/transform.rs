//! Reprojection between coordinate systems

use std::f64::consts::PI;

use super::point::Point;

/// Transformer for converting points between coordinate systems
///
/// Supports the spherical Web Mercator pair only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Earth radius in meters
    const EARTH_RADIUS: f64 = 6378137.0;

    /// Web Mercator is undefined past this latitude
    const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(&self, lon: f64, lat: f64) -> Point {
        let lat = lat.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
        let x = lon.to_radians() * Self::EARTH_RADIUS;
        let y = ((90.0 + lat) * PI / 360.0).tan().ln() * Self::EARTH_RADIUS;
        Point::new(x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> Point {
        let lon = (x / Self::EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / Self::EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Point::new(lon, lat)
    }
}
