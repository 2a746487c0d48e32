use super::{LocationSample, LocationStore};
use crate::config;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// File name of the sample database inside the data directory
pub const DB_FILE_NAME: &str = "locations.db";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS location_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        captured_at TEXT NOT NULL
    );
"#;

/// SQLite-backed store: one file, one table, one connection.
///
/// The connection sits behind a mutex, so appends never interleave and a
/// scan always sees whole rows.
pub struct SqliteLocationStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteLocationStore {
    /// Open `locations.db` in the per-user application data directory
    pub fn open_default() -> StoreResult<Self> {
        let dir = config::default_data_dir().ok_or(StoreError::NoDataDir)?;
        Self::open_in(&dir)
    }

    /// Open `locations.db` inside `dir`, creating the directory if needed
    pub fn open_in(dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::DataDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Self::open(dir.join(DB_FILE_NAME))
    }

    /// Open (or create) the database at an explicit path
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let open_err = |source| StoreError::Open {
            path: path.clone(),
            source,
        };

        let conn = Connection::open(&path).map_err(open_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(open_err)?;
        conn.execute_batch(SCHEMA).map_err(open_err)?;

        info!(path = %path.display(), "location store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Private in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(":memory:")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(value: String) -> StoreResult<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(&value) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(source) => Err(StoreError::Timestamp { value, source }),
    }
}

impl LocationStore for SqliteLocationStore {
    fn append(&self, sample: &LocationSample) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO location_entries (latitude, longitude, captured_at) VALUES (?1, ?2, ?3)",
            params![
                sample.latitude(),
                sample.longitude(),
                encode_timestamp(&sample.captured_at()),
            ],
        )
        .map_err(StoreError::persistence("append"))?;

        debug!(
            lat = sample.latitude(),
            lon = sample.longitude(),
            "sample appended"
        );
        Ok(())
    }

    fn scan(&self, visit: &mut dyn FnMut(LocationSample)) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT latitude, longitude, captured_at FROM location_entries ORDER BY id")
            .map_err(StoreError::persistence("scan"))?;
        let mut rows = stmt.query([]).map_err(StoreError::persistence("scan"))?;

        let mut read = 0;
        while let Some(row) = rows.next().map_err(StoreError::persistence("scan"))? {
            let latitude: f64 = row.get(0).map_err(StoreError::persistence("scan"))?;
            let longitude: f64 = row.get(1).map_err(StoreError::persistence("scan"))?;
            let captured_at: String = row.get(2).map_err(StoreError::persistence("scan"))?;

            // Validated on append
            visit(LocationSample {
                latitude,
                longitude,
                captured_at: decode_timestamp(captured_at)?,
            });
            read += 1;
        }
        Ok(read)
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM location_entries", [], |row| row.get(0))
            .map_err(StoreError::persistence("count"))?;
        Ok(count as usize)
    }

    fn latest(&self) -> StoreResult<Option<LocationSample>> {
        // captured_at is fixed-width RFC 3339 in UTC, so text order is time order
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT latitude, longitude, captured_at FROM location_entries
                 ORDER BY captured_at DESC, id DESC LIMIT 1",
            )
            .map_err(StoreError::persistence("latest"))?;
        let mut rows = stmt.query([]).map_err(StoreError::persistence("latest"))?;

        match rows.next().map_err(StoreError::persistence("latest"))? {
            Some(row) => {
                let latitude: f64 = row.get(0).map_err(StoreError::persistence("latest"))?;
                let longitude: f64 = row.get(1).map_err(StoreError::persistence("latest"))?;
                let captured_at: String = row.get(2).map_err(StoreError::persistence("latest"))?;
                Ok(Some(LocationSample {
                    latitude,
                    longitude,
                    captured_at: decode_timestamp(captured_at)?,
                }))
            }
            None => Ok(None),
        }
    }
}
