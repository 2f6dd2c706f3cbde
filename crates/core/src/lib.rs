//! Core types and shared functionality for yadz.
//!
//! This crate provides:
//! - Address model and the address hash used as cache key and DOM id
//! - Lookup result model with tolerant field accessors
//! - Result cache with SQLite backend
//! - Unified error types
//! - Configuration structures
//! - Injectable logging capability

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod result;

pub use address::{Address, address_hash, storage_key, trim_page_text};
pub use cache::{CacheDb, CacheEntry, OriginStore, ResultCache};
pub use config::AppConfig;
pub use error::Error;
pub use log::{MemoryLog, ScanLog, TracingLog};
pub use result::LookupResult;
