//! SQLite record store backend.

use super::{FileRecord, HashStore, InsertOutcome, StoreStats};
use crate::core::hasher::HASH_ALGORITHM;
use crate::error::StoreError;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// SQLite-backed persistent record store
///
/// Uses WAL (Write-Ahead Logging) mode for better concurrent access. The
/// single connection is shared behind a mutex; workers hold it only for the
/// duration of one statement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create a record store at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        // The UNIQUE constraint on hash is the dedup mechanism; inserts
        // racing on the same digest fail here rather than both succeeding
        conn.execute(
            "CREATE TABLE IF NOT EXISTS file_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hash TEXT NOT NULL UNIQUE,
                original_name TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                extension TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                processed_at INTEGER NOT NULL,
                source_path TEXT NOT NULL,
                target_path TEXT,
                hash_type TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_file_records_extension ON file_records(extension);
             CREATE INDEX IF NOT EXISTS idx_file_records_processed_at ON file_records(processed_at);
             CREATE INDEX IF NOT EXISTS idx_file_records_file_size ON file_records(file_size);",
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    fn to_timestamp(time: DateTime<Utc>) -> i64 {
        time.timestamp()
    }

    fn from_timestamp(timestamp: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(timestamp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::QueryFailed("store connection poisoned".to_string()))
    }

    /// Fetch a full record by hash. Mainly useful for tests and inspection.
    pub fn fetch(&self, hash: &str) -> Result<Option<FileRecord>, StoreError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT hash, original_name, file_size, extension, created_at, source_path, target_path
             FROM file_records WHERE hash = ?",
            [hash],
            |row| {
                Ok(FileRecord {
                    hash: row.get(0)?,
                    original_name: row.get(1)?,
                    file_size: row.get::<_, i64>(2)? as u64,
                    extension: row.get(3)?,
                    created_at: Self::from_timestamp(row.get(4)?),
                    source_path: PathBuf::from(row.get::<_, String>(5)?),
                    target_path: row.get::<_, Option<String>>(6)?.map(PathBuf::from),
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl HashStore for SqliteStore {
    fn put_if_absent(&self, record: &FileRecord) -> Result<InsertOutcome, StoreError> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT INTO file_records
             (hash, original_name, file_size, extension, created_at, processed_at, source_path, target_path, hash_type)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.hash,
                record.original_name,
                record.file_size as i64,
                record.extension,
                Self::to_timestamp(record.created_at),
                Self::to_timestamp(Utc::now()),
                record.source_path.to_string_lossy(),
                record.target_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
                HASH_ALGORITHM,
            ],
        );

        match inserted {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                // Lost the race (or re-saw a known hash); report who holds it
                let existing_name: String = conn
                    .query_row(
                        "SELECT original_name FROM file_records WHERE hash = ?",
                        [&record.hash],
                        |row| row.get(0),
                    )
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
                Ok(InsertOutcome::AlreadyExists { existing_name })
            }
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    fn exists_by_hash(&self, hash: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;

        let result: Result<String, _> = conn.query_row(
            "SELECT original_name FROM file_records WHERE hash = ?",
            [hash],
            |row| row.get(0),
        );

        match result {
            Ok(name) => Ok(Some(name)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    fn set_target_path(&self, hash: &str, target: &Path) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "UPDATE file_records SET target_path = ? WHERE hash = ?",
            params![target.to_string_lossy(), hash],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn statistics(&self) -> Result<StoreStats, StoreError> {
        let conn = self.lock()?;

        let total: u64 = conn
            .query_row("SELECT COUNT(*) FROM file_records", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u64)
            })
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let processed: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM file_records WHERE processed_at IS NOT NULL",
                [],
                |row| row.get::<_, i64>(0).map(|v| v as u64),
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(StoreStats {
            total,
            processed,
            pending: total - processed,
        })
    }
}
