//! SQLite-backed cache for lookup results.
//!
//! This module provides a persistent, per-origin key-value store using SQLite
//! with async access via tokio-rusqlite, and the result cache layered on top:
//!
//! - String keys scoped by page origin (`OriginStore`)
//! - `{data, timestamp}` JSON records keyed by `addr_info_<hash>`
//! - TTL plus completeness validation with eager eviction (`ResultCache`)
//! - Schema created on open
//! - WAL mode for concurrent access

pub mod connection;
pub mod results;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use results::{CacheEntry, DEFAULT_TTL, ResultCache};
pub use store::{OriginStore, StoredItem};
