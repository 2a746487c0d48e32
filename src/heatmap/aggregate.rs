use crate::store::LocationSample;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A unique coordinate and how many samples landed on it.
///
/// `latitude`/`longitude` are the first coordinate seen for the group.
/// Under a coarse [`Resolution`] the newest sample may sit elsewhere in
/// the cell; its coordinate is kept in `last_latitude`/`last_longitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub visit_count: u32,
    /// Newest capture time in the group
    pub last_visit: DateTime<Utc>,
    pub last_latitude: f64,
    pub last_longitude: f64,
}

/// How coordinates are discretized before grouping.
///
/// `Exact` groups only bit-identical coordinates. The other modes absorb GPS
/// jitter by snapping to a coarser key.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Resolution {
    #[default]
    Exact,
    /// Round to this many decimal places (5 ≈ 1.1 m at the equator)
    Decimals(u8),
    /// Snap to square cells of this many degrees
    Grid(f64),
}

/// Discretized grouping key for one coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey(u64, u64);

impl Resolution {
    #[inline(always)]
    pub fn key(&self, lat: f64, lon: f64) -> CellKey {
        match *self {
            Resolution::Exact => CellKey(exact_bits(lat), exact_bits(lon)),
            Resolution::Decimals(places) => {
                let scale = 10f64.powi(places as i32);
                CellKey(
                    (lat * scale).round() as i64 as u64,
                    (lon * scale).round() as i64 as u64,
                )
            }
            Resolution::Grid(cell) => CellKey(
                (lat / cell).floor() as i64 as u64,
                (lon / cell).floor() as i64 as u64,
            ),
        }
    }
}

/// Bit pattern with -0.0 folded onto 0.0 so key equality matches `==`
#[inline(always)]
fn exact_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Streaming visit counter. Memory grows with distinct cells, not samples.
pub struct Aggregator {
    resolution: Resolution,
    cells: HashMap<CellKey, AggregatedLocation>,
    total: usize,
}

impl Aggregator {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            cells: HashMap::new(),
            total: 0,
        }
    }

    pub fn push(&mut self, sample: LocationSample) {
        self.total += 1;
        let key = self.resolution.key(sample.latitude(), sample.longitude());
        self.cells
            .entry(key)
            .and_modify(|cell| {
                cell.visit_count += 1;
                // Later insertion wins a timestamp tie
                if sample.captured_at() >= cell.last_visit {
                    cell.last_visit = sample.captured_at();
                    cell.last_latitude = sample.latitude();
                    cell.last_longitude = sample.longitude();
                }
            })
            .or_insert(AggregatedLocation {
                latitude: sample.latitude(),
                longitude: sample.longitude(),
                visit_count: 1,
                last_visit: sample.captured_at(),
                last_latitude: sample.latitude(),
                last_longitude: sample.longitude(),
            });
    }

    /// Samples consumed so far
    pub fn total(&self) -> usize {
        self.total
    }

    /// Busiest cells first; ties broken by coordinate so output is stable
    pub fn finish(self) -> Vec<AggregatedLocation> {
        let mut out: Vec<_> = self.cells.into_values().collect();
        out.sort_by(|a, b| {
            b.visit_count
                .cmp(&a.visit_count)
                .then(a.latitude.total_cmp(&b.latitude))
                .then(a.longitude.total_cmp(&b.longitude))
        });
        out
    }
}

/// Collapse raw samples into per-location visit counts
pub fn aggregate(
    samples: impl IntoIterator<Item = LocationSample>,
    resolution: Resolution,
) -> Vec<AggregatedLocation> {
    let mut agg = Aggregator::new(resolution);
    for sample in samples {
        agg.push(sample);
    }
    agg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(lat: f64, lon: f64, minute: u32) -> LocationSample {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap();
        LocationSample::new(lat, lon, ts).unwrap()
    }

    #[test]
    fn test_counts_are_conserved() {
        let samples = vec![
            at(1.0, 1.0, 0),
            at(1.0, 1.0, 1),
            at(2.0, 2.0, 2),
            at(1.0, 1.0, 3),
            at(3.0, 3.0, 4),
            at(2.0, 2.0, 5),
        ];
        let out = aggregate(samples.clone(), Resolution::Exact);
        assert_eq!(out.len(), 3);
        let total: u32 = out.iter().map(|a| a.visit_count).sum();
        assert_eq!(total as usize, samples.len());
        assert_eq!(out[0].visit_count, 3);
        assert_eq!((out[0].latitude, out[0].longitude), (1.0, 1.0));
    }

    #[test]
    fn test_single_sample() {
        let out = aggregate([at(48.8566, 2.3522, 0)], Resolution::Exact);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].visit_count, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new(), Resolution::Exact).is_empty());
    }

    #[test]
    fn test_exact_keeps_epsilon_apart() {
        let a: f64 = 51.5074;
        let b = f64::from_bits(a.to_bits() + 1);
        let out = aggregate([at(a, 0.1, 0), at(b, 0.1, 1)], Resolution::Exact);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let out = aggregate([at(0.0, 10.0, 0), at(-0.0, 10.0, 1)], Resolution::Exact);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].visit_count, 2);
    }

    #[test]
    fn test_decimal_resolution_absorbs_jitter() {
        let out = aggregate(
            [at(37.774_901, -122.419_401, 0), at(37.774_904, -122.419_398, 1)],
            Resolution::Decimals(4),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].visit_count, 2);
    }

    #[test]
    fn test_grid_resolution() {
        let out = aggregate(
            [at(10.01, 10.01, 0), at(10.09, 10.04, 1), at(10.11, 10.01, 2)],
            Resolution::Grid(0.1),
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_last_visit_is_newest() {
        let out = aggregate([at(5.0, 5.0, 30), at(5.0, 5.0, 10)], Resolution::Exact);
        assert_eq!(out[0].last_visit, Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_deterministic_order() {
        let samples = vec![at(3.0, 3.0, 0), at(1.0, 1.0, 1), at(2.0, 2.0, 2), at(1.0, 1.0, 3)];
        let mut reversed = samples.clone();
        reversed.reverse();
        assert_eq!(
            aggregate(samples, Resolution::Exact),
            aggregate(reversed, Resolution::Exact)
        );
    }
}
