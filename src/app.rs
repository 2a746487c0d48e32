use tracing::error;
use visit_heatmap::coordinator::{MapSpan, MapView, RenderCoordinator, RenderPass};
use visit_heatmap::map::{rasterize, HeatLayers, Viewport};
use visit_heatmap::scheduler::SchedulerState;
use visit_heatmap::store::LocationSample;

/// Dots panned per key press (horizontal, vertical)
const KEY_PAN: (f64, f64) = (10.0, 6.0);

/// Blocking message shown over the map until a key is pressed
pub struct Notice {
    pub title: &'static str,
    pub body: &'static str,
}

impl Notice {
    pub fn permission_denied() -> Self {
        Self {
            title: "Permission Denied",
            body: "Location permission is required for this feature.",
        }
    }
}

/// Application state
pub struct App {
    /// Visible window; the map view the coordinator reads and recenters
    viewport: Viewport,
    /// Map area in terminal cells (inside the border)
    cols: usize,
    rows: usize,
    /// Honor recenter requests from render passes
    pub follow: bool,
    pub layers: HeatLayers,
    pub pass: RenderPass,
    pub latest: Option<LocationSample>,
    pub sampler: SchedulerState,
    pub source_name: &'static str,
    pub notice: Option<Notice>,
    pub last_error: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    needs_refresh: bool,
    viewport_moved: bool,
}

impl App {
    pub fn new(width: usize, height: usize, viewport: Viewport) -> Self {
        let (cols, rows) = inner_size(width, height);
        Self {
            viewport,
            cols,
            rows,
            follow: true,
            layers: HeatLayers::empty(cols, rows),
            pass: RenderPass::default(),
            latest: None,
            sampler: SchedulerState::Idle,
            source_name: "",
            notice: None,
            last_error: None,
            should_quit: false,
            last_mouse: None,
            needs_refresh: true,
            viewport_moved: false,
        }
    }

    /// Surface size in braille dots
    fn surface(&self) -> (f64, f64) {
        ((self.cols * 2) as f64, (self.rows * 4) as f64)
    }

    pub fn current_viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Re-run the render pass and rebuild the heat layers.
    ///
    /// A recenter request moves the viewport, which counts as a viewport
    /// change, so the pass is repeated once against the new window.
    pub fn refresh(&mut self, coordinator: &RenderCoordinator) {
        self.needs_refresh = false;
        for _ in 0..2 {
            self.viewport_moved = false;
            let (w, h) = self.surface();
            match coordinator.render(self, w, h) {
                Ok(pass) => {
                    self.pass = pass;
                    self.last_error = None;
                }
                Err(e) => {
                    error!(error = %e, "render pass failed");
                    self.last_error = Some(e.to_string());
                    return;
                }
            }
            if !self.viewport_moved {
                break;
            }
        }

        let (w, h) = self.surface();
        let marker = self.latest.and_then(|s| {
            self.viewport()
                .map(|vp| vp.project(s.latitude(), s.longitude(), w, h))
        });
        self.layers = rasterize(&self.pass.instructions, marker, self.cols, self.rows);
    }

    /// A new sample was stored
    pub fn on_sample(&mut self, sample: LocationSample) {
        self.latest = Some(sample);
        self.needs_refresh = true;
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (cols, rows) = inner_size(width, height);
        self.cols = cols;
        self.rows = rows;
        self.needs_refresh = true;
    }

    /// Manual navigation takes the map out of follow mode
    fn navigate(&mut self, f: impl FnOnce(&mut Viewport, f64, f64)) {
        let (w, h) = self.surface();
        f(&mut self.viewport, w, h);
        self.follow = false;
        self.needs_refresh = true;
    }

    /// Pan by key press direction (-1, 0, 1 on each axis)
    pub fn pan_step(&mut self, dx: i32, dy: i32) {
        self.pan(dx as f64 * KEY_PAN.0, dy as f64 * KEY_PAN.1);
    }

    /// Pan by a delta in braille dots
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.navigate(|vp, w, h| vp.pan(dx, dy, w, h));
    }

    pub fn zoom_in(&mut self) {
        self.navigate(|vp, _, _| vp.zoom_in());
    }

    pub fn zoom_out(&mut self) {
        self.navigate(|vp, _, _| vp.zoom_out());
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_dots(col, row);
        self.navigate(|vp, w, h| vp.zoom_in_at(px, py, w, h));
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_dots(col, row);
        self.navigate(|vp, w, h| vp.zoom_out_at(px, py, w, h));
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            // One cell is 2 dots wide and 4 tall
            let dx = (last_x as f64 - x as f64) * 2.0;
            let dy = (last_y as f64 - y as f64) * 4.0;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn toggle_follow(&mut self) {
        self.follow = !self.follow;
        self.needs_refresh = true;
    }

    /// Jump back onto the latest sample and resume following
    pub fn reset_view(&mut self) {
        if let Some(s) = self.latest {
            self.viewport = MapSpan::around(s.latitude(), s.longitude()).to_viewport();
        }
        self.follow = true;
        self.needs_refresh = true;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Center coordinates as a string
    pub fn center_coords(&self) -> String {
        let vp = &self.viewport;
        format!(
            "{:.4}°{}, {:.4}°{}",
            vp.center_lat.abs(),
            if vp.center_lat >= 0.0 { "N" } else { "S" },
            vp.center_lon.abs(),
            if vp.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Visible span as a string
    pub fn span_label(&self) -> String {
        format!("{:.4}°×{:.4}°", self.viewport.lat_span, self.viewport.lon_span)
    }
}

impl MapView for App {
    /// No viewport until the map area has a drawable size
    fn viewport(&self) -> Option<Viewport> {
        (self.cols > 0 && self.rows > 0).then_some(self.viewport)
    }

    fn move_to_region(&mut self, span: MapSpan) {
        if !self.follow {
            return;
        }
        let target = span.to_viewport();
        if target != self.viewport {
            self.viewport = target;
            self.viewport_moved = true;
        }
    }
}

/// Map area in cells: 2 columns of border, 2 rows of border + 1 status bar
fn inner_size(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2), height.saturating_sub(3))
}

/// Terminal cell to braille dot coordinates, accounting for the border
fn cell_to_dots(col: u16, row: u16) -> (f64, f64) {
    (
        (col.saturating_sub(1) as f64) * 2.0,
        (row.saturating_sub(1) as f64) * 4.0,
    )
}
