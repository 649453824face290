//! In-bounds pixel rectangle used for chunk reads

/// Rectangular area of an image in pixel coordinates
///
/// `(x, y)` is the top-left pixel, with `x` counting columns and `y` rows.
/// Regions handed to the chunk reader always lie inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u64,
    pub y: u64,
    pub width: u64,
    pub height: u64,
}

impl Region {
    pub fn new(x: u64, y: u64, width: u64, height: u64) -> Self {
        Region { x, y, width, height }
    }

    /// Column just past the right edge
    pub fn end_x(&self) -> u64 {
        self.x + self.width
    }

    /// Row just past the bottom edge
    pub fn end_y(&self) -> u64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlap of two regions, if they share any pixel
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let end_x = self.end_x().min(other.end_x());
        let end_y = self.end_y().min(other.end_y());
        (x < end_x && y < end_y).then(|| Region::new(x, y, end_x - x, end_y - y))
    }
}
