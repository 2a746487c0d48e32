//! Render pass: read history, aggregate, project, classify.
//!
//! The coordinator keeps no observer registry. The host calls
//! [`RenderCoordinator::render`] whenever its map view reports a viewport
//! change (or anything else it wants reflected on screen).

use crate::error::StoreResult;
use crate::heatmap::{AggregatedLocation, Aggregator, DensityTier, Resolution};
use crate::map::{ScreenPoint, Viewport};
use crate::store::LocationStore;
use std::sync::Arc;
use tracing::debug;

/// Radius of every heat blob, in surface units
pub const BLOB_RADIUS: f32 = 10.0;

/// Span of a recenter request, degrees on each axis
pub const RECENTER_SPAN: f64 = 0.03;

/// One blob for the drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInstruction {
    pub point: ScreenPoint,
    pub radius: f32,
    pub tier: DensityTier,
}

/// Request to move the map onto a coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSpan {
    pub center_lat: f64,
    pub center_lon: f64,
    pub lat_span: f64,
    pub lon_span: f64,
}

impl MapSpan {
    pub fn around(lat: f64, lon: f64) -> Self {
        Self {
            center_lat: lat,
            center_lon: lon,
            lat_span: RECENTER_SPAN,
            lon_span: RECENTER_SPAN,
        }
    }

    pub fn to_viewport(self) -> Viewport {
        Viewport::new(self.center_lat, self.center_lon, self.lat_span, self.lon_span)
    }
}

/// The map view the core reads from and steers
pub trait MapView {
    /// Currently visible window; `None` until the map is attached
    fn viewport(&self) -> Option<Viewport>;

    /// Ask the map to show `span`
    fn move_to_region(&mut self, span: MapSpan);
}

/// Which recenter requests a render pass issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecenterPolicy {
    /// One request per pass, on the most recently visited location
    #[default]
    LatestSample,
    /// One request per aggregated entry, in processing order (the last one wins)
    EveryEntry,
    Off,
}

/// Output of one render pass
#[derive(Debug, Clone, Default)]
pub struct RenderPass {
    pub instructions: Vec<DrawInstruction>,
    pub locations: Vec<AggregatedLocation>,
    /// Raw samples read this pass
    pub samples: usize,
    /// Last recenter request issued, if any
    pub recentered: Option<MapSpan>,
}

impl RenderPass {
    /// Distinct locations per tier, indexed by `DensityTier::index`
    pub fn tier_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for loc in &self.locations {
            counts[DensityTier::classify(loc.visit_count).index()] += 1;
        }
        counts
    }
}

pub struct RenderCoordinator {
    store: Arc<dyn LocationStore>,
    resolution: Resolution,
    recenter: RecenterPolicy,
}

impl RenderCoordinator {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self {
            store,
            resolution: Resolution::Exact,
            recenter: RecenterPolicy::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_recenter(mut self, policy: RecenterPolicy) -> Self {
        self.recenter = policy;
        self
    }

    /// Recompute draw instructions for a `width` x `height` surface.
    ///
    /// An absent viewport yields an empty pass without touching the store.
    pub fn render(&self, view: &mut dyn MapView, width: f64, height: f64) -> StoreResult<RenderPass> {
        let Some(viewport) = view.viewport() else {
            return Ok(RenderPass::default());
        };

        let mut agg = Aggregator::new(self.resolution);
        let samples = self.store.scan(&mut |sample| agg.push(sample))?;
        let locations = agg.finish();

        let mut instructions = Vec::with_capacity(locations.len() + 1);
        for loc in &locations {
            instructions.push(DrawInstruction {
                point: viewport.project(loc.latitude, loc.longitude, width, height),
                radius: BLOB_RADIUS,
                tier: DensityTier::classify(loc.visit_count),
            });
        }
        // A lone blob is drawn twice so the first paint never comes out blank
        if let [only] = instructions.as_slice() {
            let only = *only;
            instructions.push(only);
        }

        let recentered = match self.recenter {
            RecenterPolicy::Off => None,
            RecenterPolicy::LatestSample => {
                let latest = locations
                    .iter()
                    .max_by_key(|loc| loc.last_visit)
                    .map(|loc| MapSpan::around(loc.last_latitude, loc.last_longitude));
                if let Some(span) = latest {
                    view.move_to_region(span);
                }
                latest
            }
            RecenterPolicy::EveryEntry => locations
                .iter()
                .map(|loc| MapSpan::around(loc.latitude, loc.longitude))
                .inspect(|span| view.move_to_region(*span))
                .last(),
        };

        debug!(
            samples,
            locations = locations.len(),
            blobs = instructions.len(),
            "render pass"
        );
        Ok(RenderPass {
            instructions,
            locations,
            samples,
            recentered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocationSample, MemoryLocationStore};
    use chrono::{TimeZone, Utc};

    #[derive(Default)]
    struct FakeView {
        viewport: Option<Viewport>,
        moves: Vec<MapSpan>,
    }

    impl MapView for FakeView {
        fn viewport(&self) -> Option<Viewport> {
            self.viewport
        }

        fn move_to_region(&mut self, span: MapSpan) {
            self.moves.push(span);
        }
    }

    fn store_with(points: &[(f64, f64, u32)]) -> Arc<MemoryLocationStore> {
        let store = Arc::new(MemoryLocationStore::new());
        for &(lat, lon, minute) in points {
            let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, minute, 0).unwrap();
            store.append(&LocationSample::new(lat, lon, ts).unwrap()).unwrap();
        }
        store
    }

    fn view_at(lat: f64, lon: f64) -> FakeView {
        FakeView {
            viewport: Some(Viewport::new(lat, lon, 0.1, 0.1)),
            moves: Vec::new(),
        }
    }

    #[test]
    fn test_missing_viewport_is_noop() {
        let store = store_with(&[(1.0, 1.0, 0)]);
        let coordinator = RenderCoordinator::new(store);
        let mut view = FakeView::default();
        let pass = coordinator.render(&mut view, 400.0, 400.0).unwrap();
        assert!(pass.instructions.is_empty());
        assert!(view.moves.is_empty());
    }

    #[test]
    fn test_single_location_drawn_twice() {
        let store = store_with(&[(37.7749, -122.4194, 0)]);
        let coordinator = RenderCoordinator::new(store.clone());
        let mut view = view_at(37.7749, -122.4194);
        let pass = coordinator.render(&mut view, 400.0, 400.0).unwrap();

        assert_eq!(pass.locations.len(), 1);
        assert_eq!(pass.locations[0].visit_count, 1);
        assert_eq!(pass.instructions.len(), 2);
        assert_eq!(pass.instructions[0], pass.instructions[1]);
        assert!((pass.instructions[0].point.x - 200.0).abs() < 1e-2);
        // Storage untouched by the duplication
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_tiers_and_radius() {
        let mut points = Vec::new();
        for m in 0..12 {
            points.push((10.0, 10.0, m));
        }
        for m in 0..7 {
            points.push((10.01, 10.01, m));
        }
        points.push((10.02, 10.02, 0));
        let coordinator = RenderCoordinator::new(store_with(&points));
        let mut view = view_at(10.0, 10.0);
        let pass = coordinator.render(&mut view, 200.0, 100.0).unwrap();

        assert_eq!(pass.samples, 20);
        assert_eq!(pass.instructions.len(), 3);
        let tiers: Vec<_> = pass.instructions.iter().map(|i| i.tier).collect();
        assert_eq!(tiers, vec![DensityTier::High, DensityTier::Medium, DensityTier::Low]);
        assert!(pass.instructions.iter().all(|i| i.radius == BLOB_RADIUS));
        assert_eq!(pass.tier_counts(), [1, 1, 1]);
    }

    #[test]
    fn test_recenter_once_on_latest() {
        let store = store_with(&[(1.0, 1.0, 5), (2.0, 2.0, 40), (1.0, 1.0, 10), (3.0, 3.0, 20)]);
        let coordinator = RenderCoordinator::new(store);
        let mut view = view_at(0.0, 0.0);
        let pass = coordinator.render(&mut view, 100.0, 100.0).unwrap();

        assert_eq!(view.moves, vec![MapSpan::around(2.0, 2.0)]);
        assert_eq!(pass.recentered, Some(MapSpan::around(2.0, 2.0)));
        assert_eq!(view.moves[0].lat_span, 0.03);
    }

    #[test]
    fn test_coarser_resolution_merges_jitter() {
        let store = store_with(&[(10.00001, 10.0, 0), (10.00002, 10.0, 1), (10.0, 10.00001, 2)]);
        let exact = RenderCoordinator::new(store.clone());
        let mut view = view_at(10.0, 10.0);
        assert_eq!(exact.render(&mut view, 100.0, 100.0).unwrap().locations.len(), 3);

        let coarse = RenderCoordinator::new(store).with_resolution(Resolution::Decimals(3));
        let pass = coarse.render(&mut view, 100.0, 100.0).unwrap();
        assert_eq!(pass.locations.len(), 1);
        assert_eq!(pass.locations[0].visit_count, 3);
        assert_eq!(pass.instructions.len(), 2);
    }

    #[test]
    fn test_recenter_follows_newest_sample_within_cell() {
        // Same 0.01° cell; the newest sample is not the first one seen
        let store = store_with(&[(5.001, 5.001, 0), (5.004, 5.006, 30), (5.002, 5.002, 10)]);
        let coordinator = RenderCoordinator::new(store).with_resolution(Resolution::Grid(0.01));
        let mut view = view_at(5.0, 5.0);
        let pass = coordinator.render(&mut view, 100.0, 100.0).unwrap();

        assert_eq!(pass.locations.len(), 1);
        assert_eq!((pass.locations[0].latitude, pass.locations[0].longitude), (5.001, 5.001));
        assert_eq!(view.moves, vec![MapSpan::around(5.004, 5.006)]);
    }

    #[test]
    fn test_recenter_every_entry() {
        let store = store_with(&[(1.0, 1.0, 0), (2.0, 2.0, 1), (3.0, 3.0, 2)]);
        let coordinator = RenderCoordinator::new(store).with_recenter(RecenterPolicy::EveryEntry);
        let mut view = view_at(0.0, 0.0);
        coordinator.render(&mut view, 100.0, 100.0).unwrap();
        assert_eq!(view.moves.len(), 3);
    }

    #[test]
    fn test_recenter_off_and_empty_store() {
        let coordinator = RenderCoordinator::new(store_with(&[(1.0, 1.0, 0)])).with_recenter(RecenterPolicy::Off);
        let mut view = view_at(0.0, 0.0);
        coordinator.render(&mut view, 100.0, 100.0).unwrap();
        assert!(view.moves.is_empty());

        let coordinator = RenderCoordinator::new(store_with(&[]));
        let pass = coordinator.render(&mut view, 100.0, 100.0).unwrap();
        assert!(pass.instructions.is_empty());
        assert!(view.moves.is_empty());
    }
}
