//! Column ownership for parallel passes.

use std::str::FromStr;

/// How the columns of a surface are split among workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Partitioning {
    /// Worker `i` owns the contiguous columns `[i * stripe, (i + 1) * stripe)`
    Stripes,
    /// Worker `i` owns columns `i, i + workers, i + 2 * workers, ...`
    #[default]
    Interleaved,
}

impl FromStr for Partitioning {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stripes" | "contiguous" => Ok(Self::Stripes),
            "interleaved" | "interleave" => Ok(Self::Interleaved),
            _ => Err(format!("unknown partitioning '{}' (expected stripes or interleaved)", s)),
        }
    }
}

impl Partitioning {
    /// Stripe width for `width` columns over `workers` workers
    fn stripe(width: u32, workers: usize) -> usize {
        (width as usize).div_ceil(workers).max(1)
    }

    /// Worker that owns column `x`. `workers` must be non-zero.
    #[inline]
    pub fn owner(self, x: u32, width: u32, workers: usize) -> usize {
        match self {
            Self::Stripes => x as usize / Self::stripe(width, workers),
            Self::Interleaved => x as usize % workers,
        }
    }

    /// Columns owned by `worker`, ascending
    pub fn columns(self, worker: usize, width: u32, workers: usize) -> Vec<u32> {
        match self {
            Self::Stripes => {
                let stripe = Self::stripe(width, workers);
                let start = (worker * stripe).min(width as usize);
                let end = ((worker + 1) * stripe).min(width as usize);
                (start as u32..end as u32).collect()
            }
            Self::Interleaved => (worker as u32..width).step_by(workers).collect(),
        }
    }
}
