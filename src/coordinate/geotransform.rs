//! Affine geotransform between pixel and map space

use crate::errors::{RasterError, RasterResult};
use super::point::Point;

/// Six-coefficient affine transform
///
/// The coefficients are `[top left x, pixel width, row rotation, top left y,
/// column rotation, pixel height]`. North-up rasters have zero rotation
/// terms and a negative pixel height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    pub const fn new(coefficients: [f64; 6]) -> Self {
        GeoTransform(coefficients)
    }

    /// North-up transform from the top-left corner and pixel size
    pub fn from_origin(x0: f64, y0: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform([x0, pixel_width, 0.0, y0, 0.0, pixel_height])
    }

    /// Maps a pixel position to map coordinates
    ///
    /// `(col, row) = (0, 0)` is the top-left corner of the top-left pixel.
    pub fn apply(&self, col: f64, row: f64) -> Point {
        let g = &self.0;
        Point::new(g[0] + g[1] * col + g[2] * row, g[3] + g[4] * col + g[5] * row)
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    pub fn origin(&self) -> Point {
        Point::new(self.0[0], self.0[3])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }

    pub fn is_north_up(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0
    }

    /// Returns the transform shifted so that `(col, row)` becomes the origin
    pub fn translated(&self, col: f64, row: f64) -> Self {
        let origin = self.apply(col, row);
        let mut g = self.0;
        g[0] = origin.x;
        g[3] = origin.y;
        GeoTransform(g)
    }

    /// Computes the inverse transform
    pub fn invert(&self) -> RasterResult<Self> {
        let g = &self.0;

        if self.is_north_up() && g[1] != 0.0 && g[5] != 0.0 {
            return Ok(GeoTransform([
                -g[0] / g[1],
                1.0 / g[1],
                0.0,
                -g[3] / g[5],
                0.0,
                1.0 / g[5],
            ]));
        }

        let det = g[1] * g[5] - g[2] * g[4];
        let magnitude = g[1].abs().max(g[2].abs()).max(g[4].abs().max(g[5].abs()));
        if det.abs() <= 1e-10 * magnitude * magnitude {
            return Err(RasterError::Corrupt("geotransform is not invertible".to_string()));
        }

        let inv_det = 1.0 / det;
        Ok(GeoTransform([
            (g[2] * g[3] - g[0] * g[5]) * inv_det,
            g[5] * inv_det,
            -g[2] * inv_det,
            (-g[1] * g[3] + g[0] * g[4]) * inv_det,
            -g[4] * inv_det,
            g[1] * inv_det,
        ]))
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(coefficients: [f64; 6]) -> Self {
        GeoTransform(coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn north_up_round_trip() {
        let gt = GeoTransform::from_origin(500_000.0, 4_000_000.0, 10.0, -10.0);
        let inv = gt.invert().unwrap();

        let map = gt.apply(3.0, 7.0);
        assert_eq!(map, Point::new(500_030.0, 3_999_930.0));

        let back = inv.apply(map.x, map.y);
        assert_relative_eq!(back.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(back.y, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn rotated_round_trip() {
        let gt = GeoTransform::new([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        let inv = gt.invert().unwrap();
        let map = gt.apply(11.0, 4.0);
        let back = inv.apply(map.x, map.y);
        assert_relative_eq!(back.x, 11.0, epsilon = 1e-9);
        assert_relative_eq!(back.y, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn singular_transform_fails() {
        let gt = GeoTransform::new([0.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
        assert!(gt.invert().is_err());
    }

    #[test]
    fn translation_moves_origin() {
        let gt = GeoTransform::from_origin(0.0, 100.0, 1.0, -1.0);
        assert_eq!(gt.translated(5.0, 2.0).origin(), Point::new(5.0, 98.0));
    }
}
