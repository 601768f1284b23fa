use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Value for slot '{name}' is {size} bytes, limit is {limit}")]
    SlotTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("Time window of {0} does not fit the calendar")]
    TimeOutOfRange(Duration),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Retention and size bounds for a named slot
#[derive(Debug, Clone, Copy)]
pub struct SlotPolicy {
    pub retention: Duration,
    pub max_bytes: usize,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::days(365),
            max_bytes: 64 * 1024,
        }
    }
}

/// Local storage manager on SQLite
///
/// Two tables:
/// - `slots`: named string values with an expiry, the durable home of the
///   favorites list. A write refreshes the expiry.
/// - `entries`: JSON blobs keyed by namespace + key with a cached-at stamp,
///   used to avoid re-fetching recipe details.
pub struct CacheManager {
    conn: Connection,
}

impl CacheManager {
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Database that lives only as long as this manager
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                data TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                PRIMARY KEY(namespace, key)
            )",
            [],
        )?;

        Ok(())
    }

    /// Read a slot. Expired slots are deleted and read as absent.
    pub fn get_slot(&self, name: &str) -> Result<Option<String>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM slots WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((_, expires_at)) if expires_at <= Utc::now().timestamp() => {
                debug!("Slot '{}' expired, removing", name);
                self.remove_slot(name)?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    /// Write a slot, replacing any previous value and restarting its retention
    pub fn set_slot(&self, name: &str, value: &str, policy: &SlotPolicy) -> Result<()> {
        if value.len() > policy.max_bytes {
            return Err(CacheError::SlotTooLarge {
                name: name.to_string(),
                size: value.len(),
                limit: policy.max_bytes,
            });
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(policy.retention)
            .ok_or(CacheError::TimeOutOfRange(policy.retention))?
            .timestamp();

        self.conn.execute(
            "INSERT INTO slots (name, value, updated_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                expires_at = excluded.expires_at",
            params![name, value, now.timestamp(), expires_at],
        )?;

        Ok(())
    }

    pub fn remove_slot(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM slots WHERE name = ?1", params![name])?;
        Ok(())
    }

    /// Fetch a cached value no older than `max_age`
    pub fn get<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
        max_age: Duration,
    ) -> Result<Option<T>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT data, cached_at FROM entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((data, cached_at)) = row else {
            return Ok(None);
        };

        if cached_at < cutoff(max_age)? {
            debug!("Stale cache entry {}:{}", namespace, key);
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Store a value, replacing any previous entry for the same key
    pub fn set<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string(value)?;

        self.conn.execute(
            "INSERT INTO entries (namespace, key, data, cached_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET
                data = excluded.data,
                cached_at = excluded.cached_at",
            params![namespace, key, data, Utc::now().timestamp()],
        )?;

        Ok(())
    }

    /// Drop entries older than `max_age`; returns how many went
    pub fn purge_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = cutoff(max_age)?;
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE cached_at < ?1", params![cutoff])?;
        Ok(removed)
    }
}

// Oldest `cached_at` still inside `max_age`
fn cutoff(max_age: Duration) -> Result<i64> {
    Utc::now()
        .checked_sub_signed(max_age)
        .map(|t| t.timestamp())
        .ok_or(CacheError::TimeOutOfRange(max_age))
}
