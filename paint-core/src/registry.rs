//! Ordered site storage with click-driven insert/remove.

use std::collections::HashSet;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{ColorAllocator, Extent, PaintError, Point, Result, Rgb};

/// Clicks within this distance of a site remove it instead of adding one
pub const REMOVAL_RADIUS: f64 = 5.0;

/// Inclusive lower bound of the site count picked by [`SiteRegistry::randomize_default`]
pub const RANDOM_SITES_MIN: usize = 5;

/// Exclusive upper bound of the site count picked by [`SiteRegistry::randomize_default`]
pub const RANDOM_SITES_MAX: usize = 15;

/// A site with its assigned color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub pos: Point,
    pub color: Rgb,
}

/// Outcome of [`SiteRegistry::insert_or_remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Inserted { index: usize },
    Removed { index: usize, site: Site },
}

/// Sites in insertion order, stored as index-aligned position and color arrays.
///
/// Index order is the tie-break order used by the resolver. Every color is
/// distinct from every other.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    positions: Vec<Point>,
    colors: Vec<Rgb>,
    in_use: HashSet<Rgb>,
    allocator: ColorAllocator,
    rng: ChaCha8Rng,
}

impl SiteRegistry {
    pub fn new(seed: u64) -> Self {
        Self::with_allocator(ColorAllocator::new(seed), seed)
    }

    /// Build with a custom allocator; `seed` drives random positions only
    pub fn with_allocator(allocator: ColorAllocator, seed: u64) -> Self {
        Self {
            positions: Vec::new(),
            colors: Vec::new(),
            in_use: HashSet::new(),
            allocator,
            // Decorrelated from the color stream
            rng: ChaCha8Rng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Remove the first site within [`REMOVAL_RADIUS`] of `click`, or add a
    /// new site there if none is close enough.
    pub fn insert_or_remove(&mut self, click: Point) -> Result<Edit> {
        let hit = self
            .positions
            .iter()
            .position(|p| p.dist(&click) <= REMOVAL_RADIUS);

        match hit {
            Some(index) => {
                let site = self.take(index);
                debug!("removed site {} at ({}, {})", index, site.pos.x, site.pos.y);
                Ok(Edit::Removed { index, site })
            }
            None => {
                let index = self.insert(click)?;
                debug!("inserted site {} at ({}, {})", index, click.x, click.y);
                Ok(Edit::Inserted { index })
            }
        }
    }

    /// Append a site at `pos` with a freshly allocated color
    pub fn insert(&mut self, pos: Point) -> Result<usize> {
        let color = self.allocator.allocate(&self.in_use)?;
        self.in_use.insert(color);
        self.positions.push(pos);
        self.colors.push(color);
        Ok(self.positions.len() - 1)
    }

    /// Remove the site at `index`, shifting later sites down by one
    pub fn remove(&mut self, index: usize) -> Option<Site> {
        (index < self.positions.len()).then(|| self.take(index))
    }

    fn take(&mut self, index: usize) -> Site {
        // Position and color leave together so the color freed is the
        // removed site's own.
        let pos = self.positions.remove(index);
        let color = self.colors.remove(index);
        self.in_use.remove(&color);
        Site { pos, color }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.in_use.clear();
    }

    /// Replace all sites with `count` uniformly random ones inside `bounds`.
    ///
    /// Random positions are not deduplicated, so two sites may share a cell;
    /// only clicks guard against stacking. On failure the previous sites are
    /// kept.
    pub fn randomize(&mut self, count: usize, bounds: Extent) -> Result<()> {
        if bounds.is_empty() {
            return Err(PaintError::InvalidConfig(format!(
                "cannot place sites in a {}x{} area",
                bounds.width, bounds.height
            )));
        }

        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut in_use = HashSet::with_capacity(count);
        let mut allocator = self.allocator.clone();
        let mut rng = self.rng.clone();

        // Cells past i32::MAX have no Point, so wide bounds are sampled short
        let span_x = coordinate_span(bounds.width);
        let span_y = coordinate_span(bounds.height);
        for _ in 0..count {
            let pos = Point::new(rng.gen_range(0..span_x), rng.gen_range(0..span_y));
            let color = allocator.allocate(&in_use)?;
            in_use.insert(color);
            positions.push(pos);
            colors.push(color);
        }

        self.positions = positions;
        self.colors = colors;
        self.in_use = in_use;
        self.allocator = allocator;
        self.rng = rng;
        debug!("randomized {} sites in {}x{}", count, bounds.width, bounds.height);
        Ok(())
    }

    /// [`randomize`](Self::randomize) with a count drawn from
    /// `[RANDOM_SITES_MIN, RANDOM_SITES_MAX)`. Returns the count used.
    pub fn randomize_default(&mut self, bounds: Extent) -> Result<usize> {
        let count = self.rng.gen_range(RANDOM_SITES_MIN..RANDOM_SITES_MAX);
        self.randomize(count, bounds)?;
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Site> {
        Some(Site {
            pos: *self.positions.get(index)?,
            color: *self.colors.get(index)?,
        })
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn iter(&self) -> impl Iterator<Item = Site> + '_ {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(&pos, &color)| Site { pos, color })
    }
}

fn coordinate_span(len: u32) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}
