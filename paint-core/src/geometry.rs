//! Point and extent types for grid coordinates.

/// Integer grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point
    pub fn dist_sq(&self, other: &Point) -> u128 {
        squared_distance(self.x, self.y, other.x, other.y)
    }

    /// Distance to another point
    pub fn dist(&self, other: &Point) -> f64 {
        (self.dist_sq(other) as f64).sqrt()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Squared Euclidean distance between `(ax, ay)` and `(bx, by)`.
///
/// Exact for every pair of `i32` points: each axis difference fits in 32
/// bits, so its square fits in `u64` and the sum in `u128`. Orders points
/// the same way as the true distance, so it is used wherever only
/// comparison matters.
#[inline]
pub fn squared_distance(ax: i32, ay: i32, bx: i32, by: i32) -> u128 {
    let dx = ax.abs_diff(bx) as u64;
    let dy = ay.abs_diff(by) as u64;
    (dx * dx) as u128 + (dy * dy) as u128
}

/// Width and height of a surface or of a randomization area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `p` falls on a cell of this extent
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }
}
