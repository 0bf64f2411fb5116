//! # Scanner Module
//!
//! Discovers image files under registered directories and feeds them into the
//! work queue on a fixed cadence.
//!
//! Candidate selection is the validator's extension check plus a hidden-file
//! policy: dot-prefixed files and directories are skipped unless the scanner
//! was built with `with_hidden(true)`.
//!
//! Delivery is at-least-once: a file still sitting in a scan root gets
//! re-enqueued on the next pass, and the same path may be queued twice before
//! a worker picks it up. Downstream dedup by content hash absorbs the
//! redundant work, so the scanner never tracks what it already enqueued.

use crate::core::queue::{QueuedFile, WorkQueue};
use crate::core::supervisor::CancelToken;
use crate::core::validator::ImageValidator;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A registered scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub root: PathBuf,
    pub recursive: bool,
}

/// Periodically lists image files under registered targets.
pub struct DirectoryScanner {
    /// Targets keyed by canonical root path; registration is idempotent
    targets: Mutex<BTreeMap<PathBuf, bool>>,
    validator: ImageValidator,
    include_hidden: bool,
    interval: Duration,
}

impl DirectoryScanner {
    pub fn new(interval: Duration) -> Self {
        Self {
            targets: Mutex::new(BTreeMap::new()),
            validator: ImageValidator::new(),
            include_hidden: false,
            interval,
        }
    }

    /// Include dot-prefixed files and directories in scans
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Register a directory to scan.
    ///
    /// Returns false when the root does not exist or is not a directory.
    /// Registering the same root twice is a no-op. Safe to call concurrently.
    pub fn register_target(&self, root: &Path, recursive: bool) -> bool {
        let canonical = match fs::canonicalize(root) {
            Ok(path) => path,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "scan target does not exist");
                return false;
            }
        };

        if !canonical.is_dir() {
            warn!(root = %canonical.display(), "scan target is not a directory");
            return false;
        }

        let mut targets = self.targets.lock().unwrap();
        if targets.insert(canonical.clone(), recursive).is_none() {
            info!(root = %canonical.display(), recursive, "registered scan target");
        }
        true
    }

    /// Remove a target; no-op when absent.
    pub fn remove_target(&self, root: &Path) {
        // The root may already be gone from disk, so canonicalization can
        // fail; fall back to the path as given
        let key = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let mut targets = self.targets.lock().unwrap();
        if targets.remove(&key).is_some() {
            info!(root = %key.display(), "removed scan target");
        }
    }

    /// Snapshot of the registered targets
    pub fn targets(&self) -> Vec<ScanTarget> {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .map(|(root, recursive)| ScanTarget {
                root: root.clone(),
                recursive: *recursive,
            })
            .collect()
    }

    /// Run one pass over every registered target, enqueueing all matches.
    ///
    /// A target that vanished since registration is logged and skipped for
    /// this pass, not removed; it may reappear. Returns how many files were
    /// enqueued.
    pub fn scan_pass(&self, queue: &WorkQueue, cancel: &CancelToken) -> usize {
        let mut enqueued = 0;

        for target in self.targets() {
            if cancel.is_cancelled() {
                break;
            }

            if !target.root.is_dir() {
                warn!(root = %target.root.display(), "scan target no longer exists, skipping this pass");
                continue;
            }

            let files = collect_files(
                &target.root,
                target.recursive,
                &self.validator,
                self.include_hidden,
            );
            for path in files {
                debug!(path = %path.display(), "enqueueing file");
                queue.push(QueuedFile::new(path));
                enqueued += 1;
            }
        }

        enqueued
    }

    /// Scan loop: pass over all targets, then sleep for the configured
    /// interval, until cancelled. Cancellation is observed within one sleep
    /// or one pass.
    pub fn run(&self, queue: &WorkQueue, cancel: &CancelToken) {
        info!(interval_secs = self.interval.as_secs(), "scanner loop started");

        while !cancel.is_cancelled() {
            let enqueued = self.scan_pass(queue, cancel);
            if enqueued > 0 {
                debug!(enqueued, "scan pass complete");
            }

            if cancel.wait_timeout(self.interval) {
                break;
            }
        }

        info!("scanner loop stopped");
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}

/// List image files under a root, one level deep unless `recursive`.
///
/// Candidates are whatever the validator's extension set accepts. Unreadable
/// entries are logged and skipped; a listing never fails as a whole. Hidden
/// directories are pruned unless `include_hidden`.
pub fn collect_files(
    root: &Path,
    recursive: bool,
    validator: &ImageValidator,
    include_hidden: bool,
) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let entries = walker.into_iter().filter_entry(move |entry| {
        // Never prune the root itself, even when the root dir is dot-named
        include_hidden || entry.depth() == 0 || !is_hidden(entry.file_name())
    });

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.into_path();
                if validator.is_supported_path(&path) {
                    files.push(path);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
            }
        }
    }

    files
}
