//! TTL-bounded cache of lookup results.
//!
//! Records are stored as `{"data": <result>, "timestamp": <epoch-ms>}` under
//! `addr_info_<hash>`. A record is served only while it is younger than the
//! TTL and its FTTH sub-result succeeded. Anything else is evicted on read so
//! the next scan fetches the whole result again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{OriginStore, StoredItem};
use crate::address::{KEY_PREFIX, storage_key};
use crate::log::ScanLog;
use crate::{Error, LookupResult};

/// Seven days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A valid cached lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Address hash (without the `addr_info_` prefix).
    pub key: String,
    pub payload: LookupResult,
    /// Write time in epoch milliseconds.
    pub stored_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    data: LookupResult,
    timestamp: i64,
}

/// Lookup result cache keyed by address hash.
#[derive(Clone)]
pub struct ResultCache {
    store: OriginStore,
    ttl: Duration,
    log: Arc<dyn ScanLog>,
}

impl ResultCache {
    pub fn new(store: OriginStore, ttl: Duration, log: Arc<dyn ScanLog>) -> Self {
        Self { store, ttl, log }
    }

    pub fn store(&self) -> &OriginStore {
        &self.store
    }

    /// Get a valid entry for `hash`, evicting it if it is corrupt, stale or
    /// incomplete.
    pub async fn get(&self, hash: &str) -> Result<Option<CacheEntry>, Error> {
        self.get_at(hash, Utc::now()).await
    }

    /// [`ResultCache::get`] evaluated at an explicit point in time.
    pub async fn get_at(&self, hash: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, Error> {
        let key = storage_key(hash);
        let Some(raw) = self.store.get_item(&key).await? else {
            return Ok(None);
        };

        let record: StoredRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                self.log.error(&format!("Cache parse error: {e}"));
                self.store.remove_item(&key).await?;
                return Ok(None);
            }
        };

        let fresh = now.timestamp_millis() - record.timestamp < self.ttl_ms();
        if !fresh || !record.data.ftth_successful() {
            self.log.verbose(&format!(
                "Evicting {} entry {key}",
                if fresh { "incomplete" } else { "expired" }
            ));
            self.store.remove_item(&key).await?;
            return Ok(None);
        }

        Ok(Some(CacheEntry { key: hash.to_string(), payload: record.data, stored_at: record.timestamp }))
    }

    /// Store `payload` for `hash` stamped with the current time.
    pub async fn set(&self, hash: &str, payload: &LookupResult) -> Result<CacheEntry, Error> {
        self.set_at(hash, payload, Utc::now()).await
    }

    /// [`ResultCache::set`] with an explicit timestamp.
    pub async fn set_at(&self, hash: &str, payload: &LookupResult, now: DateTime<Utc>) -> Result<CacheEntry, Error> {
        let record = StoredRecord { data: payload.clone(), timestamp: now.timestamp_millis() };
        let json = serde_json::to_string(&record)?;
        self.store.set_item(&storage_key(hash), &json).await?;
        Ok(CacheEntry { key: hash.to_string(), payload: record.data, stored_at: record.timestamp })
    }

    /// Drop the entry for `hash`.
    pub async fn evict(&self, hash: &str) -> Result<(), Error> {
        self.store.remove_item(&storage_key(hash)).await?;
        Ok(())
    }

    /// All stored address entries of this origin, valid or not.
    pub async fn entries(&self) -> Result<Vec<StoredItem>, Error> {
        self.store.items(KEY_PREFIX).await
    }

    /// Delete entries written longer ago than the TTL.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let cutoff = Utc::now().timestamp_millis() - self.ttl_ms();
        self.store.purge_written_before(cutoff).await
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("origin", &self.store.origin())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
