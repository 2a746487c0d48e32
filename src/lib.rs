//! Visit-density heatmap: sample the device position on a timer, keep every
//! sample in SQLite, and turn the history into tiered heat blobs projected
//! onto whatever part of the map is visible.

pub mod braille;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geo;
pub mod hash;
pub mod heatmap;
pub mod map;
pub mod position;
pub mod scheduler;
pub mod store;

pub use coordinator::{DrawInstruction, MapSpan, MapView, RecenterPolicy, RenderCoordinator, RenderPass};
pub use error::{AuthorizationDenied, SampleError, StoreError};
pub use heatmap::{aggregate, AggregatedLocation, DensityTier, Resolution};
pub use map::{project, ScreenPoint, Viewport};
pub use scheduler::{SamplingScheduler, SchedulerState, TickOutcome};
pub use store::{LocationSample, LocationStore, MemoryLocationStore, SqliteLocationStore};
