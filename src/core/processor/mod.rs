//! # Processor Module
//!
//! Turns one filesystem path into a terminal outcome: validate, hash, check
//! the store for a duplicate, then either delete the duplicate or persist a
//! record and relocate the file.
//!
//! Per-item failures are values, not panics or propagated errors: every path
//! resolves to an [`Outcome`], and worker loops keep running regardless of
//! what any single file did. The processor holds no per-item state, so one
//! instance may be driven from any number of threads.

use crate::core::hasher;
use crate::core::store::{FileRecord, HashStore, InsertOutcome};
use crate::core::validator::ImageValidator;
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Terminal state of one processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The path no longer resolved to a file; not an error
    Vanished,
    /// Unsupported, empty, or corrupt; not an error
    Skipped,
    /// Content already known; the source file was deleted
    DuplicateRemoved { existing_name: String },
    /// New content; record persisted and file moved to `target`
    Stored { target: PathBuf },
    /// Something genuinely failed; the loop continues with the next item
    Error(String),
}

/// Processes queued files: validate, hash, dedup, persist, relocate.
pub struct FileProcessor {
    store: Arc<dyn HashStore>,
    validator: ImageValidator,
    output_dir: PathBuf,
}

impl FileProcessor {
    /// The output directory must already exist; creating it is a startup
    /// concern, not a per-item one.
    pub fn new(store: Arc<dyn HashStore>, output_dir: PathBuf) -> Self {
        Self {
            store,
            validator: ImageValidator::new(),
            output_dir,
        }
    }

    /// Run the full state machine for one path.
    pub fn process(&self, path: &Path) -> Outcome {
        // The queue hands out stale paths when files are deleted between
        // enqueue and pickup; that is routine, not a failure
        if !path.is_file() {
            debug!(path = %path.display(), "file vanished before processing");
            return Outcome::Vanished;
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.validator.is_supported_extension(&extension) {
            debug!(path = %path.display(), %extension, "unsupported extension, skipping");
            return Outcome::Skipped;
        }

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => {
                debug!(path = %path.display(), "file vanished while reading metadata");
                return Outcome::Vanished;
            }
        };

        if metadata.len() == 0 {
            debug!(path = %path.display(), "empty file, skipping");
            return Outcome::Skipped;
        }

        if !self.validator.validate(path) {
            debug!(path = %path.display(), "invalid or corrupt image, skipping");
            return Outcome::Skipped;
        }

        let hash = match hasher::hash_file(path) {
            Ok(hash) => hash,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "file vanished while hashing");
                return Outcome::Vanished;
            }
            Err(e) => {
                return self.fail(path, format!("failed to hash: {e}"));
            }
        };
        debug!(path = %path.display(), %hash, "computed content digest");

        match self.store.exists_by_hash(&hash) {
            Ok(Some(existing_name)) => return self.remove_duplicate(path, existing_name),
            Ok(None) => {}
            Err(e) => return self.fail(path, format!("dedup lookup failed: {e}")),
        }

        // Dimensions are informational only; a probe failure after
        // validation passed is logged and ignored
        if let Ok(info) = self.validator.probe(path) {
            debug!(
                path = %path.display(),
                width = info.width,
                height = info.height,
                format = %info.format,
                "image metadata"
            );
        }

        let record = FileRecord {
            hash: hash.clone(),
            original_name: file_name(path),
            source_path: path.to_path_buf(),
            file_size: metadata.len(),
            extension,
            created_at: Utc::now(),
            target_path: None,
        };

        match self.store.put_if_absent(&record) {
            Ok(InsertOutcome::Inserted) => {}
            // Lost the insert race against another worker: same as a dedup
            // hit, by design
            Ok(InsertOutcome::AlreadyExists { existing_name }) => {
                return self.remove_duplicate(path, existing_name);
            }
            Err(e) => return self.fail(path, format!("failed to persist record: {e}")),
        }

        match self.relocate(path) {
            Ok(target) => {
                if let Err(e) = self.store.set_target_path(&hash, &target) {
                    warn!(path = %path.display(), error = %e, "stored file but could not record target path");
                }
                info!(from = %path.display(), to = %target.display(), "stored unique image");
                Outcome::Stored { target }
            }
            Err(e) => {
                // The record is already persisted; the store now references
                // a file that was never moved. Reconciling that is an
                // external cleanup concern.
                self.fail(path, format!("record persisted but move failed: {e}"))
            }
        }
    }

    fn fail(&self, path: &Path, reason: String) -> Outcome {
        error!(path = %path.display(), %reason, "processing failed");
        Outcome::Error(reason)
    }

    fn remove_duplicate(&self, path: &Path, existing_name: String) -> Outcome {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), %existing_name, "removed duplicate");
                Outcome::DuplicateRemoved { existing_name }
            }
            Err(e) => {
                // The duplicate is still on disk; surface it
                self.fail(path, format!("failed to delete duplicate: {e}"))
            }
        }
    }

    /// Move the file into the output directory under a collision-free name.
    fn relocate(&self, path: &Path) -> io::Result<PathBuf> {
        let target = self.reserve_destination(path)?;
        if let Err(e) = move_file(path, &target) {
            // The reservation placeholder must not outlive a failed move
            let _ = fs::remove_file(&target);
            return Err(e);
        }
        Ok(target)
    }

    /// Claim the first free name among `name.ext`, `name_1.ext`,
    /// `name_2.ext`, ... by creating the file exclusively.
    ///
    /// Exclusive creation is the arbiter: workers relocating same-named
    /// files race on the filesystem, never on a stat that can go stale, so
    /// no worker can claim a name another worker already holds. The empty
    /// placeholder is replaced by the moved file.
    fn reserve_destination(&self, path: &Path) -> io::Result<PathBuf> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("file");
        let extension = path.extension().and_then(|e| e.to_str());

        let mut counter = 0;
        loop {
            let name = match (counter, extension) {
                (0, _) => file_name(path),
                (n, Some(ext)) => format!("{stem}_{n}.{ext}"),
                (n, None) => format!("{stem}_{n}"),
            };
            let candidate = self.output_dir.join(name);

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Rename, falling back to copy-and-delete when the output directory lives
/// on a different filesystem.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
