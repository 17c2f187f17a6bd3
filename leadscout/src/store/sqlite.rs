//! SQLite-backed lead store.
//!
//! Ids come from `AUTOINCREMENT`, so they only ever grow and are never handed
//! out twice, even after rows are deleted.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use crate::errors::StoreError;
use crate::model::{parse_emails, LeadRecord};

/// Table definition applied on open.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT,
    title TEXT,
    url TEXT,
    description TEXT,
    ai_insights TEXT,
    emails TEXT
);
";

const SELECT_COLUMNS: &str = "SELECT id, query, title, url, description, ai_insights, emails FROM leads";

/// Append-only lead storage with id lookup and deletion.
#[derive(Debug)]
pub struct LeadStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl LeadStore {
    /// Opens (or creates) a store file, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
        }

        let conn = Connection::open(path)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        tracing::debug!(path = %path.display(), "Opened lead store");
        Ok(store)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path })
    }

    /// File backing the store, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Inserts every record in one transaction and returns the new ids in
    /// input order. Either all rows are committed or none are.
    pub fn save(&mut self, records: &[LeadRecord]) -> Result<Vec<i64>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO leads (query, title, url, description, ai_insights, emails)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.query,
                    record.title,
                    record.url,
                    record.description,
                    record.ai_insights,
                    record.emails_joined(),
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;

        tracing::info!(count = ids.len(), "Saved leads");
        Ok(ids)
    }

    /// Every stored record, newest first.
    pub fn fetch_all(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY id DESC"))?;
        let rows = stmt.query_map([], map_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Looks up one record by id.
    pub fn get(&self, id: i64) -> Result<Option<LeadRecord>, StoreError> {
        self.conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), params![id], map_row)
            .optional()
            .map_err(StoreError::from)
    }

    /// Deletes one record. Returns `false` when no such id exists.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?1", params![id])?;
        tracing::debug!(id, removed, "Deleted lead");
        Ok(removed > 0)
    }

    /// Deletes every record and returns how many were removed.
    pub fn delete_all(&self) -> Result<usize, StoreError> {
        let removed = self.conn.execute("DELETE FROM leads", [])?;
        tracing::info!(removed, "Cleared lead store");
        Ok(removed)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<LeadRecord> {
    let emails: Option<String> = row.get(6)?;
    Ok(LeadRecord {
        id: Some(row.get(0)?),
        query: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        title: row.get(2)?,
        url: row.get(3)?,
        description: row.get(4)?,
        ai_insights: row.get(5)?,
        emails: emails.as_deref().map(parse_emails).unwrap_or_default(),
    })
}
