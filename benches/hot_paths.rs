//! Benchmarks for the render pass hot paths

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use visit_heatmap::coordinator::{MapSpan, MapView, RenderCoordinator};
use visit_heatmap::hash::{hash2, rand_signed};
use visit_heatmap::heatmap::{aggregate, Resolution};
use visit_heatmap::map::{rasterize, Viewport};
use visit_heatmap::store::{LocationSample, LocationStore, MemoryLocationStore};

const HOME: (f64, f64) = (37.7749, -122.4194);

/// Samples scattered over ~400 distinct spots near home
fn generate_samples(n: usize) -> Vec<LocationSample> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let spot = (i % 400) as u64;
            let lat = HOME.0 + (rand_signed(hash2(spot, 1)) * 0.01 * 1e4).round() / 1e4;
            let lon = HOME.1 + (rand_signed(hash2(spot, 2)) * 0.01 * 1e4).round() / 1e4;
            LocationSample::new(lat, lon, start + Duration::seconds(5 * i as i64)).unwrap()
        })
        .collect()
}

struct FixedView(Viewport);

impl MapView for FixedView {
    fn viewport(&self) -> Option<Viewport> {
        Some(self.0)
    }

    fn move_to_region(&mut self, _span: MapSpan) {}
}

fn bench_aggregate(c: &mut Criterion) {
    let samples = generate_samples(100_000);

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(samples.len() as u64));
    group.bench_function("exact_100k", |b| {
        b.iter(|| aggregate(black_box(samples.iter().copied()), Resolution::Exact));
    });
    group.bench_function("grid_100k", |b| {
        b.iter(|| aggregate(black_box(samples.iter().copied()), Resolution::Grid(0.001)));
    });
    group.finish();
}

fn bench_render_pass(c: &mut Criterion) {
    let store = Arc::new(MemoryLocationStore::new());
    for s in generate_samples(100_000) {
        store.append(&s).unwrap();
    }
    let coordinator = RenderCoordinator::new(store);
    let mut view = FixedView(Viewport::around(HOME.0, HOME.1, 0.03));

    c.bench_function("render_pass_100k", |b| {
        b.iter(|| coordinator.render(&mut view, black_box(400.0), black_box(200.0)).unwrap());
    });

    let pass = coordinator.render(&mut view, 400.0, 200.0).unwrap();
    c.bench_function("rasterize_200x50", |b| {
        b.iter(|| rasterize(black_box(&pass.instructions), None, 200, 50));
    });
}

criterion_group!(benches, bench_aggregate, bench_render_pass);
criterion_main!(benches);
