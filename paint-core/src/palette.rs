//! Distinct site colors by bounded rejection sampling.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{PaintError, Result, Rgb};

/// Site marker color, never handed out to a site
pub const MARKER_COLOR: Rgb = [0, 0, 0];

/// Surface color before any pass, never handed out to a site
pub const BACKGROUND: Rgb = [255, 255, 255];

/// Retry cap before giving up on finding an unused color
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

const RESERVED: [Rgb; 2] = [MARKER_COLOR, BACKGROUND];

/// Number of colors a site may be given
const ASSIGNABLE: usize = (1 << 24) - RESERVED.len();

/// Hands out colors that are not yet in use.
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    rng: ChaCha8Rng,
    max_attempts: usize,
}

impl ColorAllocator {
    pub fn new(seed: u64) -> Self {
        Self::with_max_attempts(seed, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(seed: u64, max_attempts: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Draw a uniformly random color absent from `in_use` and not reserved.
    ///
    /// The caller records the returned color; the allocator keeps no
    /// memory of what it has handed out.
    pub fn allocate(&mut self, in_use: &HashSet<Rgb>) -> Result<Rgb> {
        let reserved_present = RESERVED.iter().filter(|c| in_use.contains(*c)).count();
        let taken = in_use.len() - reserved_present;
        if taken >= ASSIGNABLE {
            return Err(PaintError::ExhaustedColorSpace { attempts: 0 });
        }

        for _ in 0..self.max_attempts {
            let color: Rgb = self.rng.gen();
            if !RESERVED.contains(&color) && !in_use.contains(&color) {
                return Ok(color);
            }
        }

        Err(PaintError::ExhaustedColorSpace {
            attempts: self.max_attempts,
        })
    }
}
