//! Gloda store: reads Thunderbird's global message index into dataset records.
//!
//! The store is opened read-only. Messages are left-joined with their
//! full-text content and folder location, so a message without indexed
//! text or a resolvable folder still yields a record with empty fields.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, info};

use crate::error::{Result, TmError};
use crate::model::record::{EmailRecord, RawMessage};

/// File name of the Gloda database inside a Thunderbird profile.
pub const GLODA_DB_NAME: &str = "global-messages-db.sqlite";

/// `messages.date` is microseconds since the epoch; SQLite renders it as
/// `YYYY-MM-DD HH:MM:SS` in UTC. Newest messages come first.
const EXTRACT_SQL: &str = "
    SELECT
        m.headerMessageID,
        datetime(m.date / 1000000, 'unixepoch') AS date_formatted,
        t.c3author AS from_field,
        t.c4recipients AS to_field,
        t.c1subject AS subject,
        t.c0body AS body_text,
        fl.name AS folder_path
    FROM messages m
    LEFT JOIN messagesText_content t ON m.id = t.docid
    LEFT JOIN folderLocations fl ON m.folderID = fl.id
    ORDER BY m.date DESC
";

/// Resolve the Gloda database path from a profile directory or the file itself.
///
/// Returns [`TmError::StoreNotFound`] if no database file exists there.
pub fn resolve_store_path(location: &Path) -> Result<PathBuf> {
    let db_path = if location.is_file() {
        location.to_path_buf()
    } else {
        location.join(GLODA_DB_NAME)
    };
    if !db_path.is_file() {
        return Err(TmError::StoreNotFound(db_path));
    }
    Ok(db_path)
}

/// Read-only handle on a Gloda database.
pub struct GlodaStore {
    path: PathBuf,
    conn: Connection,
}

impl GlodaStore {
    /// Open the store found at `location` (profile directory or database file).
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_store_path(location.as_ref())?;
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "Opened Gloda store");
        Ok(Self { path, conn })
    }

    /// Path of the opened database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every message as a normalized record, newest first.
    ///
    /// `progress` receives the number of rows read so far.
    pub fn read_records(&self, progress: Option<&dyn Fn(usize)>) -> Result<Vec<EmailRecord>> {
        let mut stmt = self.conn.prepare(EXTRACT_SQL)?;
        let rows = stmt.query_map([], raw_message_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(EmailRecord::from_raw(row?));
            if let Some(report) = progress {
                report(records.len());
            }
        }
        Ok(records)
    }
}

fn raw_message_from_row(row: &Row<'_>) -> rusqlite::Result<RawMessage> {
    Ok(RawMessage {
        message_id: row.get(0)?,
        date: row.get(1)?,
        from: row.get(2)?,
        to: row.get(3)?,
        subject: row.get(4)?,
        body: row.get(5)?,
        folder: row.get(6)?,
    })
}

/// Extraction outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Records in the dataset.
    pub total: usize,
    /// Records with a non-empty body.
    pub with_body: usize,
}

impl ExtractSummary {
    /// Count the records of a dataset.
    pub fn of(records: &[EmailRecord]) -> Self {
        Self {
            total: records.len(),
            with_body: records.iter().filter(|r| r.has_body).count(),
        }
    }
}

/// Extract the complete dataset from the store at `location`.
pub fn extract_dataset(
    location: &Path,
    progress: Option<&dyn Fn(usize)>,
) -> Result<Vec<EmailRecord>> {
    let store = GlodaStore::open(location)?;
    info!(path = %store.path().display(), "Extracting dataset from Gloda");
    let records = store.read_records(progress)?;
    let summary = ExtractSummary::of(&records);
    info!(
        total = summary.total,
        with_body = summary.with_body,
        "Extraction finished"
    );
    Ok(records)
}
