use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::ProgressionLedger;
use crate::session::SessionReport;
use crate::streak::StreakRecord;
use crate::util::{mean, rounded_percent};

/// How long a commit waits for another writer's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Well-known record keys
pub const LEDGER_KEY: &str = "shakaquest-stats";
pub const LAST_RESULT_KEY: &str = "shakaquest-last-result";
pub const STREAK_KEY: &str = "shakaquest-streak";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS session_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    completed_at TEXT NOT NULL,
    score INTEGER NOT NULL,
    total INTEGER NOT NULL,
    duration_seconds INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_session_history_completed_at ON session_history(completed_at);
"#;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// One completed session in the append-only history table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub duration_seconds: u64,
}

impl HistoryEntry {
    pub fn accuracy(&self) -> u32 {
        rounded_percent(u64::from(self.score), u64::from(self.total))
    }
}

impl From<&SessionReport> for HistoryEntry {
    fn from(report: &SessionReport) -> Self {
        Self {
            completed_at: report.completed_at,
            score: report.score,
            total: report.total,
            duration_seconds: report.duration_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub average_accuracy: Option<f64>,
    pub best_score: Option<u32>,
}

pub fn summarize(entries: &[HistoryEntry]) -> HistorySummary {
    let accuracies: Vec<f64> = entries.iter().map(|e| f64::from(e.accuracy())).collect();
    HistorySummary {
        sessions: entries.len(),
        average_accuracy: mean(&accuracies),
        best_score: entries.iter().map(|e| e.score).max(),
    }
}

/// Durable home of the ledger, the last session report and the history.
///
/// Reads never fail: an absent or unreadable record yields its default.
pub trait ProgressStore {
    fn load_ledger(&self) -> ProgressionLedger;

    fn load_last_report(&self) -> Option<SessionReport>;

    /// Applies `report` to the stored ledger and records it, as a single
    /// read-modify-write. Returns the ledger as persisted.
    fn commit_session(
        &mut self,
        report: &SessionReport,
        today: NaiveDate,
    ) -> Result<ProgressionLedger, StoreError>;

    /// Most recent sessions first
    fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;
}

/// SQLite-backed progress store
#[derive(Debug)]
pub struct SqliteProgressStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteProgressStore {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "progress store opened");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: None })
    }

    /// Database file backing this store; `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Overwrite a raw record, bypassing validation
    pub fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        write_raw(&self.conn, key, value, Utc::now())
    }
}

impl ProgressStore for SqliteProgressStore {
    fn load_ledger(&self) -> ProgressionLedger {
        read_or_default(&self.conn, LEDGER_KEY)
    }

    fn load_last_report(&self) -> Option<SessionReport> {
        match read_record(&self.conn, LAST_RESULT_KEY) {
            Ok(report) => report,
            Err(e) => {
                warn!(key = LAST_RESULT_KEY, error = %e, "unreadable record, ignoring");
                None
            }
        }
    }

    fn commit_session(
        &mut self,
        report: &SessionReport,
        today: NaiveDate,
    ) -> Result<ProgressionLedger, StoreError> {
        // IMMEDIATE takes the write lock up front so two completions cannot
        // both read the same ledger
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let ledger: ProgressionLedger = read_or_default(&tx, LEDGER_KEY);
        let streak: StreakRecord = read_or_default(&tx, STREAK_KEY);
        let (streak, ledger) =
            streak.register_completion(today, ledger.apply_session_report(report));

        let stamp = report.completed_at;
        write_record(&tx, LEDGER_KEY, &ledger, stamp)?;
        write_record(&tx, STREAK_KEY, &streak, stamp)?;
        write_record(&tx, LAST_RESULT_KEY, report, stamp)?;
        tx.execute(
            r#"
            INSERT INTO session_history (completed_at, score, total, duration_seconds)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                stamp.to_rfc3339(),
                report.score,
                report.total,
                report.duration_seconds,
            ],
        )?;
        tx.commit()?;

        info!(
            score = report.score,
            total_xp = ledger.total_xp,
            level = ledger.level,
            streak = ledger.streak,
            "session committed"
        );
        Ok(ledger)
    }

    fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT completed_at, score, total, duration_seconds
            FROM session_history
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| {
            let completed_at: String = row.get(0)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);

            Ok(HistoryEntry {
                completed_at,
                score: row.get(1)?,
                total: row.get(2)?,
                duration_seconds: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }
}

fn read_record<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>, StoreError> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM records WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn read_or_default<T: DeserializeOwned + Default>(conn: &Connection, key: &str) -> T {
    match read_record(conn, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "unreadable record, falling back to default");
            T::default()
        }
    }
}

fn write_record<T: Serialize + ?Sized>(
    conn: &Connection,
    key: &str,
    value: &T,
    stamp: DateTime<Utc>,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    write_raw(conn, key, &raw, stamp)
}

fn write_raw(conn: &Connection, key: &str, raw: &str, stamp: DateTime<Utc>) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        params![key, raw, stamp.to_rfc3339()],
    )?;
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct CsvRow {
    completed_at: String,
    score: u32,
    total: u32,
    duration_seconds: u64,
    accuracy: u32,
}

const CSV_HEADER: [&str; 5] = ["completed_at", "score", "total", "duration_seconds", "accuracy"];

/// Write `entries` as CSV, header first, in the order given
pub fn export_history_csv<W: io::Write>(entries: &[HistoryEntry], writer: W) -> Result<(), StoreError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(CSV_HEADER)?;
    for entry in entries {
        wtr.serialize(CsvRow {
            completed_at: entry.completed_at.to_rfc3339(),
            score: entry.score,
            total: entry.total,
            duration_seconds: entry.duration_seconds,
            accuracy: entry.accuracy(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
