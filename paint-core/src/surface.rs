//! Pixel buffer the rasterizer writes and the display layer reads.

use std::path::Path;

use crate::{Extent, Point, Result, Rgb, BACKGROUND, MARKER_COLOR};

/// Alpha the display layer applies to rasterized cells
pub const CELL_ALPHA: u8 = 100;

/// Fixed-size grid of colors.
///
/// Cells are stored column by column, so each column is one contiguous
/// slice and disjoint column sets can be borrowed mutably at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    cells: Vec<Rgb>,
}

impl Surface {
    /// Surface filled with [`BACKGROUND`]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, BACKGROUND)
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            cells: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        x as usize * self.height as usize + y as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Set one cell; out-of-range coordinates are ignored
    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.cells[i] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.cells.fill(color);
    }

    /// Mutable columns in ascending `x` order, each `height` cells long
    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut [Rgb]> + '_ {
        // chunks_mut panics on a zero chunk size; a zero-height surface has no cells anyway
        self.cells.chunks_mut(self.height.max(1) as usize)
    }

    /// Row-major RGB bytes
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.cells.len() * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.extend_from_slice(&self.cells[self.index(x, y)]);
            }
        }
        pixels
    }

    /// Row-major RGBA bytes with a fixed alpha, e.g. for an HTML canvas
    pub fn to_rgba_bytes(&self, alpha: u8) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.cells.len() * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let [r, g, b] = self.cells[self.index(x, y)];
                pixels.extend_from_slice(&[r, g, b, alpha]);
            }
        }
        pixels
    }

    /// Render to an image::RgbImage
    pub fn to_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(self.cells[self.index(x, y)])
        })
    }

    /// Write the surface to an image file, format chosen by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_image().save(path)?;
        Ok(())
    }

    /// Draw each site as a black disc of diameter 8 whose bounding box
    /// starts at `(x - 3, y - 3)`, clipped to the surface
    pub fn draw_markers(&mut self, sites: &[Point]) {
        for site in sites {
            // Work in half-cell units so the disc center (x + 1, y + 1)
            // and the cell centers are both integral.
            let (cx2, cy2) = (2 * site.x as i64 + 2, 2 * site.y as i64 + 2);
            for py in site.y as i64 - 3..site.y as i64 + 5 {
                for px in site.x as i64 - 3..site.x as i64 + 5 {
                    let dx = 2 * px + 1 - cx2;
                    let dy = 2 * py + 1 - cy2;
                    if dx * dx + dy * dy > 64 {
                        continue;
                    }
                    if px >= 0 && py >= 0 && px < self.width as i64 && py < self.height as i64 {
                        self.set(px as u32, py as u32, MARKER_COLOR);
                    }
                }
            }
        }
    }
}
