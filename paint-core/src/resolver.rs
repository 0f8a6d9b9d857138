//! Nearest-site lookup.

use crate::{squared_distance, PaintError, Point, Result};

/// Index of the site closest to `(x, y)`.
///
/// Equidistant sites resolve to the lowest index. Fails with
/// [`PaintError::EmptyRegistry`] when `sites` is empty.
pub fn resolve(x: i32, y: i32, sites: &[Point]) -> Result<usize> {
    if sites.is_empty() {
        return Err(PaintError::EmptyRegistry);
    }
    Ok(nearest_index(x, y, sites))
}

/// Linear scan used by the rasterizer's inner loop. `sites` must be non-empty.
#[inline]
pub(crate) fn nearest_index(x: i32, y: i32, sites: &[Point]) -> usize {
    let mut nearest = 0;
    let mut min_dist = u128::MAX;

    for (i, site) in sites.iter().enumerate() {
        let dist = squared_distance(x, y, site.x, site.y);
        // Strict: a later site must be closer, not merely as close
        if dist < min_dist {
            min_dist = dist;
            nearest = i;
        }
    }

    nearest
}
