// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! SQLite-backed durable store for queued actions.
//!
//! One row per pending mutation. Every write is committed before the call
//! returns, so an action survives a crash immediately after enqueue.
//! Retrieval is ordered by `enqueued_at` (insertion order breaks ties),
//! which is the replay order contract.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::action::{Method, QueuedAction};
use crate::error::{Error, Result};

/// Current schema version, stamped into `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

/// SQL schema for the pending-action store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pending_actions (
    id TEXT PRIMARY KEY,
    method TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    body TEXT,
    enqueued_at TEXT NOT NULL,
    retry_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_actions_enqueued ON pending_actions(enqueued_at);
"#;

/// Durable store for pending actions.
pub struct ActionStore {
    conn: Connection,
}

impl ActionStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL keeps writers from blocking the read snapshot taken by a
        // sync pass; busy_timeout covers the rare overlap.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let store = ActionStore { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = ActionStore { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Applies the schema and stamps the version.
    ///
    /// Refuses to open a store written by a newer schema.
    fn migrate(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            return Err(Error::CorruptedData(format!(
                "store schema version {version} is newer than supported version {SCHEMA_VERSION}"
            )));
        }

        self.conn.execute_batch(SCHEMA)?;
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        Ok(())
    }

    /// Inserts an action. The row is committed before this returns.
    pub fn insert(&self, action: &QueuedAction) -> Result<()> {
        let body = action
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO pending_actions (id, method, endpoint, body, enqueued_at, retry_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                action.id,
                action.method.as_str(),
                action.endpoint,
                body,
                format_ts(&action.enqueued_at),
                action.retry_count,
            ],
        )?;
        Ok(())
    }

    /// Returns all pending actions in replay order.
    pub fn all(&self) -> Result<Vec<QueuedAction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, method, endpoint, body, enqueued_at, retry_count
             FROM pending_actions
             ORDER BY enqueued_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map([], row_to_action)?;
        let mut actions = Vec::new();
        for row in rows {
            actions.push(row?);
        }
        Ok(actions)
    }

    /// Removes an action. Returns true if a row was deleted.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM pending_actions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Increments an action's retry count, returning the new count.
    pub fn bump_retry(&self, id: &str) -> Result<u32> {
        self.conn.execute(
            "UPDATE pending_actions SET retry_count = retry_count + 1 WHERE id = ?1",
            params![id],
        )?;

        let count: Option<u32> = self
            .conn
            .query_row(
                "SELECT retry_count FROM pending_actions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        count.ok_or_else(|| Error::CorruptedData(format!("action '{id}' vanished during retry")))
    }

    /// Removes all pending actions, returning the number deleted.
    pub fn clear(&self) -> Result<usize> {
        let changed = self.conn.execute("DELETE FROM pending_actions", [])?;
        Ok(changed)
    }

    /// Returns the number of pending actions.
    pub fn len(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM pending_actions", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Returns true if no actions are pending.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Formats a timestamp as fixed-width UTC RFC 3339 (nine fractional
/// digits) so lexicographic order in SQLite matches chronological order
/// and the full `Utc::now` precision round-trips.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn row_to_action(row: &rusqlite::Row<'_>) -> std::result::Result<QueuedAction, rusqlite::Error> {
    let method_str: String = row.get(1)?;
    let method = method_str.parse::<Method>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid method '{method_str}' in pending_actions"
            ))),
        )
    })?;

    let body: Option<String> = row.get(3)?;
    let body = body
        .map(|b| serde_json::from_str(&b))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let enqueued_str: String = row.get(4)?;
    let enqueued_at = DateTime::parse_from_rfc3339(&enqueued_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(QueuedAction {
        id: row.get(0)?,
        method,
        endpoint: row.get(2)?,
        body,
        enqueued_at,
        retry_count: row.get(5)?,
    })
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
