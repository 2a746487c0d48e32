//! Durable append-only log of raw position samples.
//!
//! The store is an explicitly constructed dependency: build one with
//! [`SqliteLocationStore::open_default`] (or [`MemoryLocationStore::new`] in
//! tests) and hand it to the sampler and the render coordinator as an
//! `Arc<dyn LocationStore>`. Opening is idempotent: the schema is created if
//! missing and left alone otherwise.

mod sqlite;

pub use sqlite::{SqliteLocationStore, DB_FILE_NAME};

use crate::error::{SampleError, StoreResult};
use crate::geo;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// One raw position observation. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    latitude: f64,
    longitude: f64,
    captured_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Result<Self, SampleError> {
        geo::validate(latitude, longitude)?;
        // Adding +0.0 folds -0.0 onto 0.0; SQLite cannot store the sign of zero
        Ok(Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
            captured_at,
        })
    }

    /// Stamp a reading with the current UTC time
    pub fn now(latitude: f64, longitude: f64) -> Result<Self, SampleError> {
        Self::new(latitude, longitude, Utc::now())
    }

    #[inline(always)]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline(always)]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline(always)]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Append-only sample storage.
///
/// Writes are serialized by the implementation; reads may run alongside a
/// write and observe each record either before or after it lands.
pub trait LocationStore: Send + Sync {
    /// Persist one sample. Not retried on failure.
    fn append(&self, sample: &LocationSample) -> StoreResult<()>;

    /// Stream every stored sample to `visit`, returning how many were read.
    fn scan(&self, visit: &mut dyn FnMut(LocationSample)) -> StoreResult<usize>;

    /// Number of stored samples
    fn count(&self) -> StoreResult<usize>;

    /// Every stored sample, in no guaranteed order. Empty history is `Ok(vec![])`.
    fn list_all(&self) -> StoreResult<Vec<LocationSample>> {
        let mut samples = Vec::new();
        self.scan(&mut |sample| samples.push(sample))?;
        Ok(samples)
    }

    /// The sample with the newest capture time
    fn latest(&self) -> StoreResult<Option<LocationSample>> {
        let mut latest: Option<LocationSample> = None;
        self.scan(&mut |sample| {
            if latest.map_or(true, |l| sample.captured_at >= l.captured_at) {
                latest = Some(sample);
            }
        })?;
        Ok(latest)
    }
}

/// In-process store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryLocationStore {
    samples: RwLock<Vec<LocationSample>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationStore for MemoryLocationStore {
    fn append(&self, sample: &LocationSample) -> StoreResult<()> {
        self.samples.write().push(*sample);
        Ok(())
    }

    fn scan(&self, visit: &mut dyn FnMut(LocationSample)) -> StoreResult<usize> {
        let samples = self.samples.read();
        for sample in samples.iter() {
            visit(*sample);
        }
        Ok(samples.len())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.samples.read().len())
    }
}
