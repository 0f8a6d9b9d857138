//! WASM bindings for paint-core.
//!
//! Exposes a stateful `VoronoiCanvas` that a page feeds pointer clicks and
//! button presses into, returning flat RGBA pixels ready for `ImageData`.

use wasm_bindgen::prelude::*;
use paint_core::{
    Button, Edit, Extent, Mode, Partitioning, RasterConfig, Session, SessionConfig, CELL_ALPHA,
};

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_err(e: paint_core::PaintError) -> JsError {
    JsError::new(&e.to_string())
}

/// Map a DOM `MouseEvent.button` code to a paint button
fn button_from_dom(code: i16) -> Option<Button> {
    match code {
        0 => Some(Button::Left),
        1 => Some(Button::Middle),
        2 => Some(Button::Right),
        _ => None,
    }
}

/// Stateful paint session bound to a canvas of fixed size.
#[wasm_bindgen]
pub struct VoronoiCanvas {
    session: Session,
    alpha: u8,
    last_repaint_ms: Option<f64>,
}

#[wasm_bindgen]
impl VoronoiCanvas {
    /// Create a canvas session. `partitioning` is "stripes" or "interleaved".
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: u32,
        height: u32,
        seed: u32,
        workers: usize,
        partitioning: &str,
    ) -> Result<VoronoiCanvas, JsError> {
        let partitioning: Partitioning = partitioning.parse().map_err(|e: String| JsError::new(&e))?;
        let mut config = SessionConfig::new(width, height);
        config.seed = seed as u64;
        config.raster = RasterConfig { workers, partitioning };
        let session = Session::new(config).map_err(js_err)?;
        Ok(Self {
            session,
            alpha: CELL_ALPHA,
            last_repaint_ms: None,
        })
    }

    /// Handle a pointer click. Returns 1 if a site was added, -1 if one was
    /// removed, 0 if nothing changed.
    pub fn click(&mut self, x: i32, y: i32, button: i16) -> Result<i32, JsError> {
        let Some(button) = button_from_dom(button) else {
            return Ok(0);
        };
        let edit = self.session.click(x, y, button).map_err(js_err)?;
        Ok(match edit {
            Some(Edit::Inserted { .. }) => 1,
            Some(Edit::Removed { .. }) => -1,
            None => 0,
        })
    }

    /// Replace the sites with a random set. Returns the new site count.
    pub fn randomize(&mut self) -> Result<usize, JsError> {
        self.session.randomize().map_err(js_err)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Switch between sequential and parallel passes
    pub fn set_parallel(&mut self, parallel: bool) {
        self.session.set_mode(if parallel { Mode::Parallel } else { Mode::Sequential });
    }

    pub fn is_parallel(&self) -> bool {
        self.session.mode() == Mode::Parallel
    }

    pub fn set_show_sites(&mut self, show: bool) {
        self.session.set_show_markers(show);
    }

    /// Alpha written into every pixel by `render`
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    /// Start over with a blank surface of a new size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.session.resize(Extent::new(width, height));
    }

    /// Repaint and return row-major RGBA pixels (length = width*height*4)
    pub fn render(&mut self) -> Result<Vec<u8>, JsError> {
        let start = js_sys::Date::now();
        self.session.repaint().map_err(js_err)?;
        self.last_repaint_ms = Some(js_sys::Date::now() - start);
        Ok(self.session.surface().to_rgba_bytes(self.alpha))
    }

    /// Milliseconds spent in the most recent `render`, or NaN before the first
    #[wasm_bindgen(getter)]
    pub fn elapsed_ms(&self) -> f64 {
        self.last_repaint_ms.unwrap_or(f64::NAN)
    }

    /// Flat [x0,y0, x1,y1, ...] site positions
    pub fn get_positions(&self) -> Vec<i32> {
        self.session
            .registry()
            .positions()
            .iter()
            .flat_map(|p| [p.x, p.y])
            .collect()
    }

    /// Flat RGB colors per site (length = site_count * 3)
    pub fn get_colors(&self) -> Vec<u8> {
        self.session
            .registry()
            .colors()
            .iter()
            .flat_map(|&[r, g, b]| [r, g, b])
            .collect()
    }

    #[wasm_bindgen(getter)]
    pub fn site_count(&self) -> usize {
        self.session.registry().len()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.session.extent().width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.session.extent().height
    }
}
