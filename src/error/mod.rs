//! # Error Module
//!
//! Error types for the image intake pipeline.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Contain per-item failures** - a single bad file is reflected in
//!   statistics, never allowed to take down a worker loop

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Startup error: {0}")]
    Startup(String),
}

/// Errors that occur while resolving directories to scan.
///
/// Unreadable entries inside a readable root are not errors; the scanner
/// logs and skips them so one bad entry never fails a whole pass.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// Errors that occur while validating an image file
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Unsupported image extension: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid or corrupt image {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur with the persistent record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open record store at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Record store query failed: {0}")]
    QueryFailed(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IntakeError>;
