//! Where position fixes come from.

mod gpsd;
mod simulated;

pub use gpsd::{GpsdSource, DEFAULT_GPSD_ADDR};
pub use simulated::SimulatedSource;

use async_trait::async_trait;

/// Accuracy hint passed to a source. Sources map it onto whatever their
/// provider understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Accuracy {
    Lowest,
    Low,
    Medium,
    High,
    Best,
}

impl Accuracy {
    /// Worst acceptable horizontal error in metres
    pub fn max_error_m(self) -> f64 {
        match self {
            Accuracy::Lowest => 3000.0,
            Accuracy::Low => 1000.0,
            Accuracy::Medium => 100.0,
            Accuracy::High => 10.0,
            Accuracy::Best => 1.0,
        }
    }

    /// Whether a fix with the given error estimate is good enough.
    /// Fixes without an estimate are accepted.
    pub fn accepts(self, error_m: Option<f64>) -> bool {
        error_m.map_or(true, |e| e <= self.max_error_m())
    }
}

/// Outcome of the one-time permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// One raw reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Estimated horizontal error, metres
    pub accuracy_m: Option<f64>,
}

/// A provider of position fixes.
///
/// `acquire` may suspend; the caller bounds it with its own timeout and
/// treats `None` as "no fix this time".
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Ask for permission to read the position. Called once at startup.
    async fn request_permission(&self) -> Permission;

    /// Read one fix at the requested accuracy
    async fn acquire(&self, accuracy: Accuracy) -> Option<Fix>;

    /// Short name for logs and the status bar
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_accepts() {
        assert!(Accuracy::Medium.accepts(None));
        assert!(Accuracy::Medium.accepts(Some(35.0)));
        assert!(!Accuracy::Medium.accepts(Some(250.0)));
        assert!(Accuracy::Low.accepts(Some(250.0)));
    }
}
