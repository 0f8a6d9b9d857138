//! Interactive editing session: applies UI events and repaints.

use log::{debug, info};

use crate::{
    CancelToken, ColorAllocator, Edit, Extent, Mode, PassStats, Point, RasterConfig, Rasterizer,
    Result, SiteRegistry, Surface, BACKGROUND, DEFAULT_MAX_ATTEMPTS,
};

/// Pointer button of a click event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Drawing area in pixels
    pub extent: Extent,
    /// Seeds site colors and random layouts
    pub seed: u64,
    pub raster: RasterConfig,
    pub mode: Mode,
    /// Draw a marker over every site after each pass
    pub show_markers: bool,
    pub max_color_attempts: usize,
}

impl SessionConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: Extent::new(width, height),
            seed: 0,
            raster: RasterConfig::default(),
            mode: Mode::default(),
            show_markers: true,
            max_color_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Owns the sites, the surface and the rasterizer.
///
/// Edits and repaints both need `&mut self`, so the registry can never
/// change while a pass is reading it.
pub struct Session {
    registry: SiteRegistry,
    surface: Surface,
    rasterizer: Rasterizer,
    mode: Mode,
    show_markers: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let allocator = ColorAllocator::with_max_attempts(config.seed, config.max_color_attempts);
        Ok(Self {
            registry: SiteRegistry::with_allocator(allocator, config.seed),
            surface: Surface::new(config.extent.width, config.extent.height),
            rasterizer: Rasterizer::new(config.raster)?,
            mode: config.mode,
            show_markers: config.show_markers,
        })
    }

    /// Add or remove a site at `(x, y)`. Only the left button edits.
    pub fn click(&mut self, x: i32, y: i32, button: Button) -> Result<Option<Edit>> {
        if button != Button::Left {
            return Ok(None);
        }
        self.registry.insert_or_remove(Point::new(x, y)).map(Some)
    }

    /// Replace the sites with 5 to 14 random ones. Returns the count used.
    pub fn randomize(&mut self) -> Result<usize> {
        let count = self.registry.randomize_default(self.surface.extent())?;
        info!("placed {} random sites", count);
        Ok(count)
    }

    pub fn randomize_with(&mut self, count: usize) -> Result<()> {
        self.registry.randomize(count, self.surface.extent())
    }

    pub fn clear(&mut self) {
        self.registry.clear();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        debug!("mode is now {:?}", self.mode);
        self.mode
    }

    pub fn set_show_markers(&mut self, show: bool) {
        self.show_markers = show;
    }

    /// Replace the surface with a blank one of a new size
    pub fn resize(&mut self, extent: Extent) {
        self.surface = Surface::new(extent.width, extent.height);
    }

    /// Redraw the whole surface from the current sites.
    ///
    /// With fewer than two sites there is no partition to show, so the
    /// surface is cleared to the background and no pass runs. A cancelled
    /// pass returns the error and leaves the last completed frame in place.
    pub fn repaint(&mut self) -> Result<Option<PassStats>> {
        let stats = if self.registry.len() >= 2 {
            Some(
                self.rasterizer
                    .rasterize(&mut self.surface, &self.registry, self.mode)?,
            )
        } else {
            self.surface.fill(BACKGROUND);
            None
        };

        if self.show_markers {
            self.surface.draw_markers(self.registry.positions());
        }
        Ok(stats)
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn extent(&self) -> Extent {
        self.surface.extent()
    }

    pub fn last_elapsed_ms(&self) -> Option<f64> {
        self.rasterizer.last_elapsed_ms()
    }

    pub fn cancel_handle(&self) -> CancelToken {
        self.rasterizer.cancel_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MARKER_COLOR;

    fn session(width: u32, height: u32) -> Session {
        let mut config = SessionConfig::new(width, height);
        config.show_markers = false;
        config.seed = 21;
        Session::new(config).unwrap()
    }

    #[test]
    fn test_only_left_clicks_edit() {
        let mut s = session(50, 50);
        assert_eq!(s.click(10, 10, Button::Right).unwrap(), None);
        assert_eq!(s.click(10, 10, Button::Middle).unwrap(), None);
        assert!(s.registry().is_empty());
        assert_eq!(
            s.click(10, 10, Button::Left).unwrap(),
            Some(Edit::Inserted { index: 0 })
        );
        assert!(matches!(
            s.click(12, 11, Button::Left).unwrap(),
            Some(Edit::Removed { index: 0, .. })
        ));
    }

    #[test]
    fn test_repaint_needs_two_sites() {
        let mut s = session(20, 20);
        s.click(5, 5, Button::Left).unwrap();
        assert!(s.repaint().unwrap().is_none());
        assert_eq!(s.surface(), &Surface::new(20, 20));

        s.click(15, 15, Button::Left).unwrap();
        let stats = s.repaint().unwrap().unwrap();
        assert_eq!(stats.sites, 2);
        let colors = s.registry().colors().to_vec();
        assert_eq!(s.surface().get(0, 0), Some(colors[0]));
        assert_eq!(s.surface().get(19, 19), Some(colors[1]));

        // Dropping back to one site blanks the surface again
        s.click(15, 15, Button::Left).unwrap();
        assert!(s.repaint().unwrap().is_none());
        assert_eq!(s.surface().get(19, 19), Some(BACKGROUND));
    }

    #[test]
    fn test_mode_toggle_keeps_output() {
        let mut s = session(40, 30);
        s.randomize_with(12).unwrap();
        assert_eq!(s.mode(), Mode::Sequential);
        s.repaint().unwrap();
        let sequential = s.surface().clone();

        assert_eq!(s.toggle_mode(), Mode::Parallel);
        let stats = s.repaint().unwrap().unwrap();
        assert_eq!(stats.mode, Mode::Parallel);
        assert_eq!(s.surface(), &sequential);
        assert!(s.last_elapsed_ms().is_some());
    }

    #[test]
    fn test_randomize_and_clear() {
        let mut s = session(64, 64);
        let n = s.randomize().unwrap();
        assert_eq!(s.registry().len(), n);
        assert!(s.registry().positions().iter().all(|&p| s.extent().contains(p)));

        s.clear();
        assert!(s.registry().is_empty());
        s.repaint().unwrap();
        assert_eq!(s.surface(), &Surface::new(64, 64));
    }

    #[test]
    fn test_markers_drawn_over_cells() {
        let mut s = session(30, 30);
        s.set_show_markers(true);
        s.click(5, 5, Button::Left).unwrap();
        s.click(25, 25, Button::Left).unwrap();
        s.repaint().unwrap();
        assert_eq!(s.surface().get(5, 5), Some(MARKER_COLOR));
        assert_eq!(s.surface().get(25, 25), Some(MARKER_COLOR));
        assert_eq!(s.surface().get(0, 29), Some(s.registry().colors()[0]));
    }

    #[test]
    fn test_cancelled_repaint_keeps_last_frame() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let mut s = session(512, 512);
        s.set_show_markers(true);
        s.randomize_with(64).unwrap();
        s.repaint().unwrap();
        let last_frame = s.surface().clone();

        s.randomize_with(64).unwrap();
        let handle = s.cancel_handle();
        let done = AtomicBool::new(false);
        let result = std::thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    handle.cancel();
                    std::thread::yield_now();
                }
            });
            let result = s.repaint();
            done.store(true, Ordering::SeqCst);
            result
        });
        assert!(matches!(result, Err(crate::PaintError::Cancelled)));
        assert!(s.surface() == &last_frame, "cancelled repaint changed the surface");

        // The following repaint shows the new layout
        s.repaint().unwrap();
        assert!(s.surface() != &last_frame);
    }

    #[test]
    fn test_resize_recreates_surface() {
        let mut s = session(10, 10);
        s.randomize_with(3).unwrap();
        s.repaint().unwrap();
        s.resize(Extent::new(25, 5));
        assert_eq!(s.surface().dimensions(), (25, 5));
        s.repaint().unwrap();
        assert!(s.surface().get(24, 4).is_some_and(|c| c != BACKGROUND));
    }
}
