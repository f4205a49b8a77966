//! SQLite journal of submitted transactions and their observed outcome.

use crate::client::{Confirmation, TerminalStatus, TransactionHandle};
use crate::types::{Address, FunctionId};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub hash: String,
    pub sender: Address,
    pub function: String,
    pub submitted_utc: i64,
    /// submitted | succeeded | failed | expired | timed_out
    pub status: String,
    pub vm_status: Option<String>,
    pub version: Option<u64>,
}

/// Local record of what this machine submitted. Not consulted by the client itself.
pub struct Journal {
    conn: Mutex<Connection>,
}

impl Journal {
    /// Open or create the journal at `path`. Creates parent dirs if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                hash TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                function TEXT NOT NULL,
                submitted_utc INTEGER NOT NULL,
                status TEXT NOT NULL,
                vm_status TEXT,
                version INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_tx_submitted ON transactions(submitted_utc);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, JournalError> {
        self.conn
            .lock()
            .map_err(|e| JournalError::Io(std::io::Error::other(e.to_string())))
    }

    pub fn record_submitted(
        &self,
        handle: &TransactionHandle,
        function: &FunctionId,
    ) -> Result<(), JournalError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO transactions (hash, sender, function, submitted_utc, status)
             VALUES (?1, ?2, ?3, ?4, 'submitted')",
            rusqlite::params![handle.hash, handle.sender.to_string(), function.to_string(), now],
        )?;
        Ok(())
    }

    /// Update the status of an already journaled transaction. Unknown hashes are ignored.
    pub fn record_confirmation(&self, confirmation: &Confirmation) -> Result<(), JournalError> {
        let (status, vm_status, version) = match confirmation {
            Confirmation::TimedOut { .. } => ("timed_out", None, None),
            Confirmation::Confirmed(r) => match &r.status {
                TerminalStatus::Succeeded => ("succeeded", None, r.version),
                TerminalStatus::Failed { vm_status } => ("failed", Some(vm_status.clone()), r.version),
                TerminalStatus::Expired => ("expired", None, None),
            },
        };
        let version = version
            .map(i64::try_from)
            .transpose()
            .map_err(|e| JournalError::Corrupt(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "UPDATE transactions SET status = ?2, vm_status = ?3, version = ?4 WHERE hash = ?1",
            rusqlite::params![confirmation.handle().hash, status, vm_status, version],
        )?;
        Ok(())
    }

    pub fn get(&self, hash: &str) -> Result<Option<JournalEntry>, JournalError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT hash, sender, function, submitted_utc, status, vm_status, version
             FROM transactions WHERE hash = ?1",
        )?;
        let row = stmt.query_row([hash], raw_row).optional()?;
        row.map(into_entry).transpose()
    }

    /// Most recent first.
    pub fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT hash, sender, function, submitted_utc, status, vm_status, version
             FROM transactions ORDER BY submitted_utc DESC, rowid DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit], raw_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_entry).collect()
    }
}

type RawRow = (String, String, String, i64, String, Option<String>, Option<i64>);

fn raw_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
    ))
}

fn into_entry(row: RawRow) -> Result<JournalEntry, JournalError> {
    let (hash, sender, function, submitted_utc, status, vm_status, version) = row;
    Ok(JournalEntry {
        sender: sender
            .parse()
            .map_err(|e| JournalError::Corrupt(format!("{}: {}", hash, e)))?,
        hash,
        function,
        submitted_utc,
        status,
        vm_status,
        version: version.map(|v| v.max(0) as u64),
    })
}
