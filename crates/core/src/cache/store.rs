//! Per-origin string key-value storage.
//!
//! Mirrors the `getItem`/`setItem`/`removeItem` contract of browser local
//! storage: values are opaque strings, keys are unique per origin, and one
//! origin never sees another origin's entries.

use super::connection::CacheDb;
use crate::Error;
use chrono::Utc;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Key-value store scoped to one page origin.
#[derive(Clone, Debug)]
pub struct OriginStore {
    db: CacheDb,
    origin: String,
}

/// A stored key with its last write time (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub key: String,
    pub updated_at: i64,
}

impl CacheDb {
    /// Open the key-value store for an origin (e.g. `https://www.yad2.co.il`).
    pub fn origin_store(&self, origin: &str) -> Result<OriginStore, Error> {
        let origin = origin.trim();
        if origin.is_empty() {
            return Err(Error::InvalidInput("origin cannot be empty".into()));
        }
        Ok(OriginStore { db: self.clone(), origin: origin.to_string() })
    }
}

impl OriginStore {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Get the value stored under `key`, if any.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let origin = self.origin.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE origin = ?1 AND key = ?2")?;

                match stmt.query_row(params![origin, key], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the value stored under `key`.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let origin = self.origin.clone();
        let key = key.to_string();
        let value = value.to_string();
        let updated_at = Utc::now().timestamp_millis();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_store (origin, key, value, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(origin, key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![origin, key, value, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// Returns whether a row was deleted.
    pub async fn remove_item(&self, key: &str) -> Result<bool, Error> {
        let origin = self.origin.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM kv_store WHERE origin = ?1 AND key = ?2", params![origin, key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List keys starting with `prefix`, newest first.
    pub async fn items(&self, prefix: &str) -> Result<Vec<StoredItem>, Error> {
        let origin = self.origin.clone();
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        self.db
            .conn
            .call(move |conn| -> Result<Vec<StoredItem>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, updated_at FROM kv_store
                    WHERE origin = ?1 AND key LIKE ?2 ESCAPE '\\'
                    ORDER BY updated_at DESC, key ASC",
                )?;
                let rows = stmt.query_map(params![origin, pattern], |row| {
                    Ok(StoredItem { key: row.get(0)?, updated_at: row.get(1)? })
                })?;

                let mut items = Vec::new();
                for row in rows {
                    items.push(row?);
                }
                Ok(items)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries last written before `cutoff_ms` (epoch milliseconds).
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_written_before(&self, cutoff_ms: i64) -> Result<u64, Error> {
        let origin = self.origin.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM kv_store WHERE origin = ?1 AND updated_at < ?2",
                    params![origin, cutoff_ms],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry of this origin.
    pub async fn clear(&self) -> Result<u64, Error> {
        let origin = self.origin.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM kv_store WHERE origin = ?1", params![origin])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
