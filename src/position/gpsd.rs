use super::{Accuracy, Fix, Permission, PositionSource};
use crate::error::SourceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Where gpsd listens by default
pub const DEFAULT_GPSD_ADDR: &str = "127.0.0.1:2947";

const WATCH: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// gpsd JSON report; only time-position-velocity reports matter here
#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum Report {
    #[serde(rename = "TPV")]
    Tpv(Tpv),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Tpv {
    /// 0/1 = no fix, 2 = 2D, 3 = 3D
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Horizontal error estimate (newer gpsd)
    eph: Option<f64>,
    epx: Option<f64>,
    epy: Option<f64>,
}

impl Tpv {
    fn horizontal_error(&self) -> Option<f64> {
        self.eph.or(match (self.epx, self.epy) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, y) => x.or(y),
        })
    }

    fn fix(&self) -> Option<Fix> {
        if self.mode < 2 {
            return None;
        }
        Some(Fix {
            latitude: self.lat?,
            longitude: self.lon?,
            accuracy_m: self.horizontal_error(),
        })
    }
}

/// Reads fixes from a gpsd daemon over its JSON socket protocol.
///
/// Every acquisition opens a fresh watch session and returns the first
/// TPV report carrying a 2D or 3D fix. The caller's timeout is what bounds
/// the wait when the receiver has no fix.
pub struct GpsdSource {
    addr: String,
}

impl GpsdSource {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn watch(&self) -> Result<Lines<BufReader<TcpStream>>, SourceError> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(WATCH).await?;
        Ok(BufReader::new(stream).lines())
    }
}

/// Pull lines until a usable TPV report shows up.
///
/// `Ok(None)` means a fix arrived but was too coarse for `accuracy`.
async fn next_fix<R>(lines: &mut Lines<R>, accuracy: Accuracy) -> Result<Option<Fix>, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        let report = match serde_json::from_str::<Report>(&line) {
            Ok(report) => report,
            Err(e) => {
                debug!(error = %e, "skipping unparseable gpsd line");
                continue;
            }
        };
        let Report::Tpv(tpv) = report else {
            continue;
        };
        let Some(fix) = tpv.fix() else {
            continue;
        };
        if accuracy.accepts(fix.accuracy_m) {
            return Ok(Some(fix));
        }
        debug!(error_m = ?fix.accuracy_m, "discarding coarse gpsd fix");
        return Ok(None);
    }
    Err(SourceError::Closed)
}

#[async_trait]
impl PositionSource for GpsdSource {
    async fn request_permission(&self) -> Permission {
        match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => {
                info!(addr = %self.addr, "gpsd reachable");
                Permission::Granted
            }
            Ok(Err(e)) => {
                warn!(addr = %self.addr, error = %e, "gpsd unreachable");
                Permission::Denied
            }
            Err(_) => {
                warn!(addr = %self.addr, "gpsd probe timed out");
                Permission::Denied
            }
        }
    }

    async fn acquire(&self, accuracy: Accuracy) -> Option<Fix> {
        let result = match self.watch().await {
            Ok(mut lines) => next_fix(&mut lines, accuracy).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(fix) => fix,
            Err(e) => {
                warn!(addr = %self.addr, error = %e, "gpsd read failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "gpsd"
    }
}
