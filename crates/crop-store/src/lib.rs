//! SQLite-backed submission history.
//!
//! Every write opens its own connection and commits a single immediate
//! transaction, so concurrent writers from separate threads or processes
//! serialize on SQLite's own file lock; no connection is held between calls.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crop_core::{FeatureVector, RecorderError, Submission, SubmissionId, SubmissionRecorder};
use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};
use thiserror::Error;
use tracing::debug;

/// Result alias for submission store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS FarmerData (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    N INTEGER NOT NULL,
    P INTEGER NOT NULL,
    K INTEGER NOT NULL,
    temperature REAL NOT NULL,
    humidity REAL NOT NULL,
    PH REAL NOT NULL,
    rainfall REAL NOT NULL
);
";

const INSERT_SQL: &str = "
INSERT INTO FarmerData (N, P, K, temperature, humidity, PH, rainfall)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only store of submissions in the `FarmerData` table.
#[derive(Debug, Clone)]
pub struct SubmissionStore {
    path: PathBuf,
}

impl SubmissionStore {
    /// Open or create the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)?;
        debug!(path = %path.display(), "submission store ready");
        Ok(Self { path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one submission and return its id.
    pub fn insert(&self, f: &FeatureVector) -> Result<SubmissionId> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            INSERT_SQL,
            params![f.nitrogen, f.phosphorus, f.potassium, f.temperature, f.humidity, f.ph, f.rainfall],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(SubmissionId(id))
    }

    /// Most recent submissions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Submission>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, N, P, K, temperature, humidity, PH, rainfall
             FROM FarmerData ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], decode_submission_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM FarmerData", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    // The file must already exist; a vanished database is an error, not a fresh one.
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

impl SubmissionRecorder for SubmissionStore {
    fn record(&self, features: &FeatureVector) -> std::result::Result<SubmissionId, RecorderError> {
        self.insert(features).map_err(RecorderError::new)
    }
}

fn decode_submission_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: SubmissionId(row.get(0)?),
        features: FeatureVector {
            nitrogen: row.get(1)?,
            phosphorus: row.get(2)?,
            potassium: row.get(3)?,
            temperature: row.get(4)?,
            humidity: row.get(5)?,
            ph: row.get(6)?,
            rainfall: row.get(7)?,
        },
    })
}
