use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::StoreError;
use crate::model::{Locations, ResortSnapshot};

/// Who asked for a snapshot. Persisted next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    pub force: bool,
    pub origin: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    pub locations: Locations,
}

/// Append-only snapshot log plus diagnostic records.
pub trait SnapshotStore: Send + Sync {
    fn append(
        &self,
        snapshot: &ResortSnapshot,
        created_at: DateTime<Utc>,
        request: &RequestInfo,
    ) -> Result<i64, StoreError>;

    /// Most recently created snapshot; later insert wins a tie.
    fn latest(&self) -> Result<Option<StoredSnapshot>, StoreError>;

    fn record_response(&self, at: DateTime<Utc>, status: u16, preview: &str) -> Result<(), StoreError>;

    fn record_error(&self, at: DateTime<Utc>, context: &str, message: &str) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn stats(&self) -> Result<Stats, StoreError> {
        let conn = self.conn()?;
        let snapshots: usize = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |r| r.get(0))?;
        let responses: usize =
            conn.query_row("SELECT COUNT(*) FROM source_responses", [], |r| r.get(0))?;
        let errors: usize = conn.query_row("SELECT COUNT(*) FROM errors", [], |r| r.get(0))?;
        let last_error = conn
            .query_row(
                "SELECT occurred_at, context, message FROM errors ORDER BY occurred_at DESC, id DESC LIMIT 1",
                [],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)),
            )
            .optional()?;
        Ok(Stats {
            snapshots,
            responses,
            errors,
            last_error,
        })
    }
}

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            id          INTEGER PRIMARY KEY,
            created_at  TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            locations   TEXT NOT NULL,
            request     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_snapshots_created ON snapshots(created_at);

        -- Raw upstream answers, truncated
        CREATE TABLE IF NOT EXISTS source_responses (
            id          INTEGER PRIMARY KEY,
            received_at TEXT NOT NULL,
            status      INTEGER NOT NULL,
            preview     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS errors (
            id          INTEGER PRIMARY KEY,
            occurred_at TEXT NOT NULL,
            context     TEXT NOT NULL CHECK(context IN ('fetch','parse')),
            message     TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

fn to_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_text(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp(s.to_string()))
}

impl SnapshotStore for SqliteStore {
    fn append(
        &self,
        snapshot: &ResortSnapshot,
        created_at: DateTime<Utc>,
        request: &RequestInfo,
    ) -> Result<i64, StoreError> {
        let locations = serde_json::to_string(&snapshot.locations)?;
        let request = serde_json::to_string(request)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO snapshots (created_at, timestamp, locations, request) VALUES (?1, ?2, ?3, ?4)",
            params![to_text(created_at), to_text(snapshot.timestamp), locations, request],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn latest(&self) -> Result<Option<StoredSnapshot>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                "SELECT id, created_at, timestamp, locations FROM snapshots
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                [],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, created_at, timestamp, locations)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredSnapshot {
            id,
            created_at: from_text(&created_at)?,
            timestamp: from_text(&timestamp)?,
            locations: serde_json::from_str(&locations)?,
        }))
    }

    fn record_response(&self, at: DateTime<Utc>, status: u16, preview: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO source_responses (received_at, status, preview) VALUES (?1, ?2, ?3)",
            params![to_text(at), status, preview],
        )?;
        Ok(())
    }

    fn record_error(&self, at: DateTime<Utc>, context: &str, message: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO errors (occurred_at, context, message) VALUES (?1, ?2, ?3)",
            params![to_text(at), context, message],
        )?;
        Ok(())
    }
}

// ── Stats ──

pub struct Stats {
    pub snapshots: usize,
    pub responses: usize,
    pub errors: usize,
    /// `(occurred_at, context, message)` of the newest failure record.
    pub last_error: Option<(String, String, String)>,
}
