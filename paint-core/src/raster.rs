//! Full-surface rasterization, sequential or split across column-owning workers.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::resolver::nearest_index;
use crate::{PaintError, Partitioning, Point, Result, Rgb, SiteRegistry, Surface};

/// Worker count used when none is configured
pub const DEFAULT_WORKERS: usize = 4;

/// Execution strategy for a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sequential,
    Parallel,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Sequential => Self::Parallel,
            Self::Parallel => Self::Sequential,
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "single" => Ok(Self::Sequential),
            "parallel" | "multi" => Ok(Self::Parallel),
            _ => Err(format!("unknown mode '{}' (expected sequential or parallel)", s)),
        }
    }
}

/// Worker layout for parallel passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterConfig {
    pub workers: usize,
    pub partitioning: Partitioning,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            partitioning: Partitioning::default(),
        }
    }
}

/// Shared flag that stops the pass in flight.
///
/// Every pass clears it on entry, so a cancel only affects the pass running
/// when it arrives.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Summary of a finished pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStats {
    pub mode: Mode,
    pub sites: usize,
    /// Cells written; zero for a skipped pass
    pub cells: usize,
    /// Wall-clock time, when a clock is available
    pub elapsed: Option<Duration>,
}

/// Brute-force nearest-site rasterizer
pub struct Rasterizer {
    config: RasterConfig,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
    cancel: CancelToken,
    last_elapsed: Option<Duration>,
    /// Off-screen frame; swapped with the caller's surface when a pass completes
    scratch: Surface,
}

impl Rasterizer {
    pub fn new(config: RasterConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(PaintError::InvalidConfig("worker count must be at least 1".into()));
        }

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("raster-{}", i))
            .build()?;

        Ok(Self {
            config,
            #[cfg(feature = "parallel")]
            pool,
            cancel: CancelToken::new(),
            last_elapsed: None,
            scratch: Surface::new(0, 0),
        })
    }

    pub fn config(&self) -> RasterConfig {
        self.config
    }

    /// Handle for stopping passes from another thread
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Duration of the most recent pass; `None` if it had no sites or was cancelled
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_elapsed
    }

    pub fn last_elapsed_ms(&self) -> Option<f64> {
        self.last_elapsed.map(|d| d.as_secs_f64() * 1000.0)
    }

    /// Paint every cell of `surface` with the color of its nearest site.
    ///
    /// Blocks until every cell is written. With no sites the surface is left
    /// untouched. The pass paints an off-screen frame and swaps it in only
    /// once complete, so a cancelled pass returns [`PaintError::Cancelled`]
    /// with `surface` exactly as it was before the call.
    pub fn rasterize(
        &mut self,
        surface: &mut Surface,
        registry: &SiteRegistry,
        mode: Mode,
    ) -> Result<PassStats> {
        self.cancel.reset();
        self.last_elapsed = None;

        let sites = registry.positions();
        if sites.is_empty() {
            debug!("no sites, skipping {:?} pass", mode);
            return Ok(PassStats { mode, sites: 0, cells: 0, elapsed: None });
        }

        let start = clock();
        let colors = registry.colors();
        let cells = surface.extent().area();

        let mut frame = std::mem::replace(&mut self.scratch, Surface::new(0, 0));
        if frame.dimensions() != surface.dimensions() {
            frame = Surface::new(surface.width(), surface.height());
        }

        match mode {
            Mode::Sequential => {
                fill_columns(frame.columns_mut().enumerate(), sites, colors, &self.cancel)
            }
            Mode::Parallel => self.fill_partitioned(&mut frame, sites, colors),
        }

        if self.cancel.is_cancelled() {
            self.scratch = frame;
            warn!("{:?} pass over {} sites cancelled", mode, sites.len());
            return Err(PaintError::Cancelled);
        }

        std::mem::swap(surface, &mut frame);
        self.scratch = frame;

        let elapsed = start.map(|s| s.elapsed());
        self.last_elapsed = elapsed;
        debug!(
            "{:?} pass: {} sites, {} cells, {:.2} ms",
            mode,
            sites.len(),
            cells,
            elapsed.map_or(f64::NAN, |d| d.as_secs_f64() * 1000.0),
        );

        Ok(PassStats { mode, sites: sites.len(), cells, elapsed })
    }

    /// Split the surface into per-worker column sets and fill each one.
    ///
    /// Every column slice is handed to exactly one worker, so workers never
    /// share a cell and no locking is needed.
    fn fill_partitioned(&self, surface: &mut Surface, sites: &[Point], colors: &[Rgb]) {
        let workers = self.config.workers;
        let scheme = self.config.partitioning;
        let width = surface.width();

        let mut partitions: Vec<Vec<(usize, &mut [Rgb])>> =
            (0..workers).map(|_| Vec::new()).collect();
        for (x, column) in surface.columns_mut().enumerate() {
            partitions[scheme.owner(x as u32, width, workers)].push((x, column));
        }

        let cancel = &self.cancel;

        #[cfg(feature = "parallel")]
        self.pool.scope(|s| {
            for partition in partitions {
                s.spawn(move |_| fill_columns(partition, sites, colors, cancel));
            }
        });

        // No threads available: run the same partitions back to back
        #[cfg(not(feature = "parallel"))]
        for partition in partitions {
            fill_columns(partition, sites, colors, cancel);
        }
    }
}

/// Resolve and write every cell of the given `(x, column)` pairs
fn fill_columns<'a, I>(columns: I, sites: &[Point], colors: &[Rgb], cancel: &CancelToken)
where
    I: IntoIterator<Item = (usize, &'a mut [Rgb])>,
{
    for (x, column) in columns {
        if cancel.is_cancelled() {
            return;
        }
        for (y, cell) in column.iter_mut().enumerate() {
            *cell = colors[nearest_index(x as i32, y as i32, sites)];
        }
    }
}

// Instant::now panics on wasm32-unknown-unknown
#[cfg(not(target_arch = "wasm32"))]
fn clock() -> Option<Instant> {
    Some(Instant::now())
}

#[cfg(target_arch = "wasm32")]
fn clock() -> Option<Instant> {
    None
}
