//! # Store Module
//!
//! Persistent, content-addressed record store.
//!
//! The hash column is the dedup mechanism: uniqueness is enforced at the
//! storage layer, so two workers racing to insert the same digest cannot both
//! succeed. A lost race surfaces as [`InsertOutcome::AlreadyExists`], which
//! callers treat as a duplicate, never as an error.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata persisted for every unique file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Content digest, hex; globally unique
    pub hash: String,
    /// File name at discovery time
    pub original_name: String,
    /// Where the file was discovered
    pub source_path: PathBuf,
    pub file_size: u64,
    /// Lowercase extension without the dot
    pub extension: String,
    pub created_at: DateTime<Utc>,
    /// Where the file was moved to, set after relocation
    pub target_path: Option<PathBuf>,
}

/// Result of a conditional insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was new and is now persisted
    Inserted,
    /// A record with this hash already exists
    AlreadyExists { existing_name: String },
}

/// Aggregate store counters
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: u64,
    pub processed: u64,
    pub pending: u64,
}

/// Content-addressed lookup and insert, keyed by file digest.
///
/// Implementations must enforce hash uniqueness at the storage layer, not by
/// check-then-insert, so concurrent inserts of the same hash resolve to one
/// `Inserted` and one `AlreadyExists`.
pub trait HashStore: Send + Sync {
    /// Insert a record unless its hash already exists.
    fn put_if_absent(&self, record: &FileRecord) -> Result<InsertOutcome, StoreError>;

    /// Return the original name recorded for a hash, if any.
    fn exists_by_hash(&self, hash: &str) -> Result<Option<String>, StoreError>;

    /// Record where a file ended up after relocation.
    fn set_target_path(&self, hash: &str, target: &Path) -> Result<(), StoreError>;

    /// Aggregate counters over all records.
    fn statistics(&self) -> Result<StoreStats, StoreError>;
}
