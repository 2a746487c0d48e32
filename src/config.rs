//! Host settings, read from the environment.
//!
//! | Variable             | Default                                  |
//! |----------------------|------------------------------------------|
//! | `HEATMAP_SOURCE`     | `sim` (`gpsd` for a real receiver)       |
//! | `HEATMAP_GPSD_ADDR`  | `127.0.0.1:2947`                         |
//! | `HEATMAP_DATA_DIR`   | `<local data dir>/visit-heatmap`         |
//! | `HEATMAP_HOME`       | `37.7749,-122.4194` (simulated walk)     |
//! | `HEATMAP_PERMISSION` | unset; `deny` refuses location access    |
//! | `RUST_LOG`           | `info`                                   |

use crate::position::{Permission, DEFAULT_GPSD_ADDR};
use std::path::PathBuf;
use tracing::warn;

const APP_DIR: &str = "visit-heatmap";

/// San Francisco, the default home of the simulated walk
pub const DEFAULT_HOME: (f64, f64) = (37.7749, -122.4194);

/// Per-user application data directory, if the platform has one
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Simulated { home: (f64, f64) },
    Gpsd { addr: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: SourceKind,
    /// `None` when neither the environment nor the platform gives one
    pub data_dir: Option<PathBuf>,
    /// Forced permission answer for the simulated source
    pub permission: Permission,
    /// Values that were ignored in favor of a default
    pub issues: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production)
    ///
    /// Nothing is logged here: settings are read before the subscriber
    /// exists. Call [`Settings::log_issues`] once logging is up.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut issues = Vec::new();

        let home = match get("HEATMAP_HOME") {
            Some(raw) => parse_home(&raw).unwrap_or_else(|| {
                issues.push(format!("HEATMAP_HOME {raw:?} is not \"lat,lon\"; using default"));
                DEFAULT_HOME
            }),
            None => DEFAULT_HOME,
        };

        let source = match get("HEATMAP_SOURCE").as_deref().map(str::trim) {
            None | Some("") | Some("sim") | Some("simulated") => SourceKind::Simulated { home },
            Some("gpsd") => SourceKind::Gpsd {
                addr: get("HEATMAP_GPSD_ADDR").unwrap_or_else(|| DEFAULT_GPSD_ADDR.to_string()),
            },
            Some(other) => {
                issues.push(format!("unknown HEATMAP_SOURCE {other:?}; using simulated source"));
                SourceKind::Simulated { home }
            }
        };

        let data_dir = get("HEATMAP_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_data_dir);

        let permission = match get("HEATMAP_PERMISSION").as_deref() {
            Some("deny") | Some("denied") => Permission::Denied,
            _ => Permission::Granted,
        };

        Self {
            source,
            data_dir,
            permission,
            issues,
        }
    }

    /// Report every ignored value at `warn`
    pub fn log_issues(&self) {
        for issue in &self.issues {
            warn!("{}", issue);
        }
    }
}

fn parse_home(raw: &str) -> Option<(f64, f64)> {
    let (lat, lon) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    crate::geo::validate(lat, lon).ok()?;
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.source, SourceKind::Simulated { home: DEFAULT_HOME });
        assert_eq!(s.permission, Permission::Granted);
        assert_eq!(s.data_dir, default_data_dir());
        assert!(s.issues.is_empty());
    }

    #[test]
    fn test_gpsd_source() {
        let s = settings(&[("HEATMAP_SOURCE", "gpsd"), ("HEATMAP_GPSD_ADDR", "10.0.0.2:2947")]);
        assert_eq!(
            s.source,
            SourceKind::Gpsd {
                addr: "10.0.0.2:2947".into()
            }
        );
    }

    #[test]
    fn test_home_and_overrides() {
        let s = settings(&[
            ("HEATMAP_HOME", " 51.5074 , -0.1278 "),
            ("HEATMAP_DATA_DIR", "/tmp/heat"),
            ("HEATMAP_PERMISSION", "deny"),
        ]);
        assert_eq!(s.source, SourceKind::Simulated { home: (51.5074, -0.1278) });
        assert_eq!(s.data_dir, Some(PathBuf::from("/tmp/heat")));
        assert_eq!(s.permission, Permission::Denied);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let s = settings(&[("HEATMAP_HOME", "95,0"), ("HEATMAP_SOURCE", "carrier-pigeon")]);
        assert_eq!(s.source, SourceKind::Simulated { home: DEFAULT_HOME });
        assert_eq!(s.issues.len(), 2);
        assert!(s.issues[0].contains("HEATMAP_HOME"));
        assert!(s.issues[1].contains("carrier-pigeon"));
    }
}
