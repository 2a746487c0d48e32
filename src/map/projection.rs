use crate::geo::{clamp_lat, wrap_lon};

/// Tightest span the viewport zooms to (degrees)
pub const MIN_SPAN: f64 = 0.0005;
/// Widest latitude span
pub const MAX_LAT_SPAN: f64 = 180.0;
/// Widest longitude span
pub const MAX_LON_SPAN: f64 = 360.0;

const ZOOM_STEP: f64 = 1.5;

/// Visible geographic window: center plus the degrees covered on each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Center latitude (-90 to 90)
    pub center_lat: f64,
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Degrees of latitude top to bottom (> 0)
    pub lat_span: f64,
    /// Degrees of longitude left to right (> 0)
    pub lon_span: f64,
}

/// Position on the drawing surface, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl Viewport {
    pub fn new(center_lat: f64, center_lon: f64, lat_span: f64, lon_span: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            lat_span,
            lon_span,
        }
    }

    /// Square window of `span` degrees around a coordinate
    pub fn around(lat: f64, lon: f64, span: f64) -> Self {
        Self::new(lat, lon, span, span)
    }

    /// Whole world
    pub fn world() -> Self {
        Self::new(0.0, 0.0, MAX_LAT_SPAN, MAX_LON_SPAN)
    }

    /// West edge longitude
    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.center_lon - self.lon_span / 2.0
    }

    /// North edge latitude
    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.center_lat + self.lat_span / 2.0
    }

    /// Linear map of (lat, lon) onto a `width` x `height` surface.
    /// Points outside the window land outside [0, width] x [0, height].
    #[inline(always)]
    pub fn project(&self, lat: f64, lon: f64, width: f64, height: f64) -> ScreenPoint {
        let x = (lon - self.left()) / self.lon_span * width;
        let y = (self.top() - lat) / self.lat_span * height;
        ScreenPoint {
            x: x as f32,
            y: y as f32,
        }
    }

    /// Surface pixel back to (lat, lon)
    pub fn unproject(&self, px: f64, py: f64, width: f64, height: f64) -> (f64, f64) {
        let lon = self.left() + px / width * self.lon_span;
        let lat = self.top() - py / height * self.lat_span;
        (lat, lon)
    }

    /// Check if a coordinate falls inside the window
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let dlat = (lat - self.center_lat).abs();
        let dlon = (lon - self.center_lon).abs();
        dlat <= self.lat_span / 2.0 && dlon <= self.lon_span / 2.0
    }

    /// Pan by a pixel delta on a surface of the given size
    pub fn pan(&mut self, dx: f64, dy: f64, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.center_lon = wrap_lon(self.center_lon + dx / width * self.lon_span);
        self.center_lat = clamp_lat(self.center_lat - dy / height * self.lat_span);
    }

    /// Zoom in by a fixed step
    pub fn zoom_in(&mut self) {
        self.scale_spans(1.0 / ZOOM_STEP);
    }

    /// Zoom out by a fixed step
    pub fn zoom_out(&mut self) {
        self.scale_spans(ZOOM_STEP);
    }

    /// Zoom in keeping the coordinate under (px, py) fixed on screen
    pub fn zoom_in_at(&mut self, px: f64, py: f64, width: f64, height: f64) {
        self.zoom_at(px, py, width, height, 1.0 / ZOOM_STEP);
    }

    /// Zoom out keeping the coordinate under (px, py) fixed on screen
    pub fn zoom_out_at(&mut self, px: f64, py: f64, width: f64, height: f64) {
        self.zoom_at(px, py, width, height, ZOOM_STEP);
    }

    fn zoom_at(&mut self, px: f64, py: f64, width: f64, height: f64, factor: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        // Geographic coordinate under the cursor before zooming
        let (lat, lon) = self.unproject(px, py, width, height);

        self.scale_spans(factor);

        // Where that coordinate lands now, and the pan that brings it back
        let moved = self.project(lat, lon, width, height);
        self.pan(moved.x as f64 - px, moved.y as f64 - py, width, height);
    }

    fn scale_spans(&mut self, factor: f64) {
        self.lat_span = (self.lat_span * factor).clamp(MIN_SPAN, MAX_LAT_SPAN);
        self.lon_span = (self.lon_span * factor).clamp(MIN_SPAN, MAX_LON_SPAN);
    }
}

/// Project against an optional viewport. `None` means the surface is not
/// attached to a live map yet, so there is nothing to draw.
#[inline(always)]
pub fn project(
    lat: f64,
    lon: f64,
    viewport: Option<&Viewport>,
    width: f64,
    height: f64,
) -> Option<ScreenPoint> {
    viewport.map(|vp| vp.project(lat, lon, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(37.7749, -122.4194, 0.1, 0.1);
        let p = project(37.7749, -122.4194, Some(&vp), 400.0, 400.0).unwrap();
        assert!(close(p.x, 200.0), "x = {}", p.x);
        assert!(close(p.y, 200.0), "y = {}", p.y);
    }

    #[test]
    fn test_project_corners() {
        let vp = Viewport::new(10.0, 20.0, 2.0, 4.0);
        let nw = vp.project(11.0, 18.0, 100.0, 50.0);
        assert!(close(nw.x, 0.0) && close(nw.y, 0.0));
        let se = vp.project(9.0, 22.0, 100.0, 50.0);
        assert!(close(se.x, 100.0) && close(se.y, 50.0));
    }

    #[test]
    fn test_project_outside_is_still_computed() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 1.0);
        let p = vp.project(0.0, 1.0, 100.0, 100.0);
        assert!(close(p.x, 150.0));
        assert!(!vp.contains(0.0, 1.0));
    }

    #[test]
    fn test_project_without_viewport() {
        assert_eq!(project(1.0, 2.0, None, 400.0, 400.0), None);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(-33.86, 151.2, 0.03, 0.03);
        let p = vp.project(-33.855, 151.19, 320.0, 240.0);
        let (lat, lon) = vp.unproject(p.x as f64, p.y as f64, 320.0, 240.0);
        assert!((lat + 33.855).abs() < 1e-5);
        assert!((lon - 151.19).abs() < 1e-5);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 1.0);
        vp.pan(50.0, 0.0, 100.0, 100.0);
        assert!((vp.center_lon - 0.5).abs() < 1e-12);
        vp.pan(0.0, 50.0, 100.0, 100.0);
        assert!((vp.center_lat + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_pan_wraps_and_clamps() {
        let mut vp = Viewport::new(89.0, 179.0, 10.0, 10.0);
        vp.pan(50.0, -50.0, 100.0, 100.0);
        assert!(vp.center_lon < 0.0);
        assert_eq!(vp.center_lat, 90.0);
    }

    #[test]
    fn test_zoom_limits() {
        let mut vp = Viewport::world();
        vp.zoom_out();
        assert_eq!(vp.lat_span, MAX_LAT_SPAN);
        for _ in 0..100 {
            vp.zoom_in();
        }
        assert_eq!(vp.lat_span, MIN_SPAN);
    }

    #[test]
    fn test_zoom_at_keeps_cursor_coordinate() {
        let mut vp = Viewport::new(40.0, -74.0, 1.0, 1.0);
        let before = vp.unproject(25.0, 75.0, 100.0, 100.0);
        vp.zoom_in_at(25.0, 75.0, 100.0, 100.0);
        let after = vp.unproject(25.0, 75.0, 100.0, 100.0);
        assert!((before.0 - after.0).abs() < 1e-4);
        assert!((before.1 - after.1).abs() < 1e-4);
    }
}
