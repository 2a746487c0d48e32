mod geometry;
mod projection;
mod renderer;

pub use projection::{project, ScreenPoint, Viewport, MAX_LAT_SPAN, MAX_LON_SPAN, MIN_SPAN};
pub use renderer::{rasterize, HeatLayers};
