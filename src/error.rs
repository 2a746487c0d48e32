//! Error types shared by the store, the sampler and the position sources.

use std::path::PathBuf;

/// Result type for location store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the durable sample store.
///
/// Initialization failures (`DataDir`, `Open`) are fatal to the host;
/// everything else is a persistence failure surfaced to the caller of the
/// single operation that hit it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open location store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("no per-user data directory available on this platform")]
    NoDataDir,

    #[error("persistence failure during {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("stored timestamp {value:?} is not RFC 3339: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl StoreError {
    pub(crate) fn persistence(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StoreError::Persistence { operation, source }
    }
}

/// A coordinate outside the WGS84 range
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
}

/// Location permission was refused; the sampler stays disarmed for the
/// life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("location permission denied")]
pub struct AuthorizationDenied;

/// Failure talking to a position provider. Sources turn these into a
/// missing fix; they never reach the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("i/o error talking to position provider: {0}")]
    Io(#[from] std::io::Error),
    #[error("position provider closed the connection")]
    Closed,
}
