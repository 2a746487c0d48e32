//! Periodic position sampling.
//!
//! ```text
//!   Idle ──arm(Granted)──▶ Armed ──tick──▶ Sampling
//!     │                      ▲                │
//!  arm(Denied)               └────────────────┘
//!     ▼
//!   Idle (for good)
//! ```
//!
//! A tick that finds the scheduler already `Sampling` is coalesced: it
//! returns at once without touching the position source, so no two
//! acquisitions are ever in flight together.

use crate::error::{AuthorizationDenied, StoreResult};
use crate::position::{Accuracy, Permission, PositionSource};
use crate::store::{LocationSample, LocationStore};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Time between ticks
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);
/// Longest a single acquisition may take
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Armed = 1,
    Sampling = 2,
}

impl SchedulerState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SchedulerState::Armed,
            2 => SchedulerState::Sampling,
            _ => SchedulerState::Idle,
        }
    }
}

/// Why a tick produced no sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source did not answer within the timeout
    Timeout,
    /// The source answered with nothing
    NoFix,
    /// The source answered with coordinates outside the valid range
    InvalidFix,
}

/// Result of one tick that did not fail to persist
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Stored(LocationSample),
    Skipped(SkipReason),
    /// A previous tick was still sampling
    Coalesced,
    /// Permission was never granted
    NotArmed,
}

#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    pub interval: Duration,
    pub accuracy: Accuracy,
    pub timeout: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: SAMPLE_INTERVAL,
            accuracy: Accuracy::Medium,
            timeout: ACQUIRE_TIMEOUT,
        }
    }
}

/// Puts the state back to `Armed` however the sampling future ends
struct SamplingGuard<'a>(&'a AtomicU8);

impl Drop for SamplingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(SchedulerState::Armed as u8, Ordering::Release);
    }
}

pub struct SamplingScheduler {
    source: Arc<dyn PositionSource>,
    store: Arc<dyn LocationStore>,
    config: SamplingConfig,
    state: AtomicU8,
    permission: OnceLock<Permission>,
    latest: watch::Sender<Option<LocationSample>>,
}

impl SamplingScheduler {
    pub fn new(source: Arc<dyn PositionSource>, store: Arc<dyn LocationStore>) -> Self {
        Self::with_config(source, store, SamplingConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn PositionSource>,
        store: Arc<dyn LocationStore>,
        config: SamplingConfig,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            source,
            store,
            config,
            state: AtomicU8::new(SchedulerState::Idle as u8),
            permission: OnceLock::new(),
            latest,
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Feed in the permission answer. Only the first answer counts: once
    /// denied, the scheduler stays idle for the life of the process.
    pub fn arm(&self, permission: Permission) -> Result<(), AuthorizationDenied> {
        match *self.permission.get_or_init(|| permission) {
            Permission::Granted => {
                let _ = self.state.compare_exchange(
                    SchedulerState::Idle as u8,
                    SchedulerState::Armed as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                info!(source = self.source.name(), "sampler armed");
                Ok(())
            }
            Permission::Denied => {
                warn!(source = self.source.name(), "location permission denied; sampler stays idle");
                Err(AuthorizationDenied)
            }
        }
    }

    /// Receives every sample the scheduler stores
    pub fn subscribe(&self) -> watch::Receiver<Option<LocationSample>> {
        self.latest.subscribe()
    }

    /// Run one sampling cycle.
    ///
    /// Timeouts and empty readings are skips, not errors. A failed append is
    /// returned to the caller; the scheduler stays armed either way.
    pub async fn tick(&self) -> StoreResult<TickOutcome> {
        if let Err(current) = self.state.compare_exchange(
            SchedulerState::Armed as u8,
            SchedulerState::Sampling as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Ok(match SchedulerState::from_u8(current) {
                SchedulerState::Sampling => TickOutcome::Coalesced,
                _ => TickOutcome::NotArmed,
            });
        }
        let _guard = SamplingGuard(&self.state);

        let reading = tokio::time::timeout(self.config.timeout, self.source.acquire(self.config.accuracy)).await;
        let fix = match reading {
            Err(_) => return Ok(TickOutcome::Skipped(SkipReason::Timeout)),
            Ok(None) => return Ok(TickOutcome::Skipped(SkipReason::NoFix)),
            Ok(Some(fix)) => fix,
        };

        let sample = match LocationSample::now(fix.latitude, fix.longitude) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "discarding fix with invalid coordinates");
                return Ok(TickOutcome::Skipped(SkipReason::InvalidFix));
            }
        };

        self.store.append(&sample)?;
        self.latest.send_replace(Some(sample));
        Ok(TickOutcome::Stored(sample))
    }

    /// Tick every interval until the task is dropped. The first tick fires
    /// one interval after start; ticks missed while sampling are skipped.
    pub async fn run(self: Arc<Self>) {
        if self.state() == SchedulerState::Idle {
            debug!("sampler not armed; run loop exits");
            return;
        }

        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.tick().await {
                Ok(TickOutcome::Stored(sample)) => debug!(
                    lat = sample.latitude(),
                    lon = sample.longitude(),
                    "sample stored"
                ),
                Ok(TickOutcome::Skipped(reason)) => debug!(?reason, "tick skipped"),
                Ok(outcome) => debug!(?outcome, "tick not run"),
                Err(e) => warn!(error = %e, "failed to persist sample"),
            }
        }
    }
}
