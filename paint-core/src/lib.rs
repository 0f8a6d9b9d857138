//! Brute-force Voronoi rasterization for interactively edited site sets.
//!
//! Every cell of a [`Surface`] is painted with the color of its nearest
//! site. Passes run either on the caller's thread or across a fixed set of
//! workers that each own a disjoint set of columns, and both produce
//! pixel-identical output.

mod geometry;
mod palette;
mod partition;
mod raster;
mod registry;
mod resolver;
mod session;
mod surface;

pub use geometry::{squared_distance, Extent, Point};
pub use palette::{ColorAllocator, BACKGROUND, DEFAULT_MAX_ATTEMPTS, MARKER_COLOR};
pub use partition::Partitioning;
pub use raster::{CancelToken, Mode, PassStats, RasterConfig, Rasterizer, DEFAULT_WORKERS};
pub use registry::{
    Edit, Site, SiteRegistry, RANDOM_SITES_MAX, RANDOM_SITES_MIN, REMOVAL_RADIUS,
};
pub use resolver::resolve;
pub use session::{Button, Session, SessionConfig};
pub use surface::{Surface, CELL_ALPHA};

/// RGB color tuple
pub type Rgb = [u8; 3];

/// Error type for rasterization and registry operations
#[derive(Debug, thiserror::Error)]
pub enum PaintError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No sites provided")]
    EmptyRegistry,

    #[error("No unused color found after {attempts} attempts")]
    ExhaustedColorSpace { attempts: usize },

    #[error("Rasterization pass cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "parallel")]
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, PaintError>;
