//! # Supervisor Module
//!
//! Lifecycle orchestration for the continuous pipeline, plus the one-shot
//! batch mode.
//!
//! ## Lifecycle
//! `Idle -> Running -> Stopping -> Idle`, re-entrant: a supervisor may be
//! started again after a clean stop. `start()` spawns one scanner loop,
//! a small pool of processor loops, and a reporting loop; `stop()` raises
//! the shared cancel token and waits for every loop to confirm exit, up to
//! a bounded join timeout, then proceeds regardless.

mod cancel;

pub use cancel::CancelToken;

use crate::config::Config;
use crate::core::processor::{FileProcessor, Outcome};
use crate::core::queue::WorkQueue;
use crate::core::scanner::{collect_files, DirectoryScanner};
use crate::core::stats::{Snapshot, Statistics};
use crate::core::store::{HashStore, SqliteStore};
use crate::core::validator::ImageValidator;
use crate::error::{IntakeError, Result, ScanError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long `stop()` waits for all loops to confirm exit before proceeding
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long processor loops block on the queue before re-checking
/// cancellation
const POP_TIMEOUT: Duration = Duration::from_millis(200);

/// Reporting cadence while the queue has work
const BUSY_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Reporting cadence while the queue is drained
const IDLE_REPORT_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopping,
}

/// Everything that exists only while the pipeline runs
struct Running {
    cancel: CancelToken,
    done_rx: Receiver<&'static str>,
    loop_count: usize,
}

/// Owns the pipeline: scanner, workers, reporter, statistics, store handle.
pub struct Supervisor {
    config: Config,
    stats: Arc<Statistics>,
    state: Mutex<(Lifecycle, Option<Running>)>,
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stats: Arc::new(Statistics::new()),
            state: Mutex::new((Lifecycle::Idle, None)),
        }
    }

    /// Current counters; meaningful after `start()` or during batch runs
    pub fn statistics(&self) -> Snapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().0 == Lifecycle::Running
    }

    /// Start the continuous pipeline.
    ///
    /// No-op with a warning when already running. Fails outright, without
    /// entering the running state, when the store cannot be opened, the
    /// output directory cannot be created, or no scan root is valid.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.0 == Lifecycle::Running {
            warn!("supervisor is already running");
            return Ok(());
        }

        let store: Arc<dyn HashStore> = Arc::new(SqliteStore::open(&self.config.store_path)?);

        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            IntakeError::Startup(format!(
                "cannot create output directory {}: {e}",
                self.config.output_dir.display()
            ))
        })?;

        let scanner = Arc::new(DirectoryScanner::new(self.config.scan_interval));
        let mut valid_roots = 0;
        for root in &self.config.scan_roots {
            if scanner.register_target(root, self.config.recursive) {
                valid_roots += 1;
            }
        }
        if valid_roots == 0 {
            return Err(IntakeError::Startup(
                "no valid scan targets configured".to_string(),
            ));
        }

        self.stats.reset();

        let queue = WorkQueue::new();
        let cancel = CancelToken::new();
        let (done_tx, done_rx) = unbounded();

        self.spawn_scanner(Arc::clone(&scanner), &queue, &cancel, &done_tx);
        let workers = self.config.workers.max(1);
        for index in 0..workers {
            self.spawn_processor(index, Arc::clone(&store), &queue, &cancel, &done_tx);
        }
        self.spawn_reporter(&queue, &cancel, &done_tx);

        // Loops hold their own store and queue clones; both are released
        // when the last loop exits
        *state = (
            Lifecycle::Running,
            Some(Running {
                cancel,
                done_rx,
                loop_count: workers + 2,
            }),
        );

        info!(
            roots = valid_roots,
            workers,
            output = %self.config.output_dir.display(),
            "intake pipeline started"
        );
        Ok(())
    }

    /// Stop the pipeline.
    ///
    /// Idempotent; safe to call when already idle. Blocks until every loop
    /// confirms exit or the join timeout elapses, whichever is first. The
    /// store connection closes when the last loop drops its handle.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();

        let Some(running) = state.1.take() else {
            warn!("supervisor is not running");
            state.0 = Lifecycle::Idle;
            return;
        };

        state.0 = Lifecycle::Stopping;
        info!("stopping intake pipeline");
        running.cancel.cancel();

        let deadline = Instant::now() + JOIN_TIMEOUT;
        let mut remaining = running.loop_count;
        while remaining > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                warn!(remaining, "join timeout elapsed, proceeding with shutdown");
                break;
            }
            match running.done_rx.recv_timeout(left) {
                Ok(name) => {
                    debug!(worker = name, "loop exited");
                    remaining -= 1;
                }
                Err(_) => {
                    warn!(remaining, "join timeout elapsed, proceeding with shutdown");
                    break;
                }
            }
        }

        info!(stats = %self.stats.snapshot(), "final statistics");

        state.0 = Lifecycle::Idle;
        info!("intake pipeline stopped");
    }

    fn spawn_scanner(
        &self,
        scanner: Arc<DirectoryScanner>,
        queue: &WorkQueue,
        cancel: &CancelToken,
        done_tx: &Sender<&'static str>,
    ) {
        let queue = queue.clone();
        let cancel = cancel.clone();
        let done_tx = done_tx.clone();

        thread::Builder::new()
            .name("intake-scanner".to_string())
            .spawn(move || {
                scanner.run(&queue, &cancel);
                let _ = done_tx.send("scanner");
            })
            .expect("failed to spawn scanner thread");
    }

    fn spawn_processor(
        &self,
        index: usize,
        store: Arc<dyn HashStore>,
        queue: &WorkQueue,
        cancel: &CancelToken,
        done_tx: &Sender<&'static str>,
    ) {
        let processor = FileProcessor::new(store, self.config.output_dir.clone());
        let stats = Arc::clone(&self.stats);
        let queue = queue.clone();
        let cancel = cancel.clone();
        let done_tx = done_tx.clone();

        thread::Builder::new()
            .name(format!("intake-worker-{index}"))
            .spawn(move || {
                debug!("processor loop started");
                while !cancel.is_cancelled() {
                    let Some(item) = queue.pop(POP_TIMEOUT) else {
                        continue;
                    };
                    let outcome = processor.process(&item.path);
                    if let Outcome::Error(reason) = &outcome {
                        error!(path = %item.path.display(), %reason, "item failed");
                    }
                    stats.record(&outcome);
                }
                debug!("processor loop stopped");
                let _ = done_tx.send("processor");
            })
            .expect("failed to spawn processor thread");
    }

    fn spawn_reporter(&self, queue: &WorkQueue, cancel: &CancelToken, done_tx: &Sender<&'static str>) {
        let stats = Arc::clone(&self.stats);
        let queue = queue.clone();
        let cancel = cancel.clone();
        let done_tx = done_tx.clone();

        thread::Builder::new()
            .name("intake-reporter".to_string())
            .spawn(move || {
                loop {
                    // Report more often while there is work in flight
                    let interval = if queue.is_empty() {
                        IDLE_REPORT_INTERVAL
                    } else {
                        BUSY_REPORT_INTERVAL
                    };
                    if cancel.wait_timeout(interval) {
                        break;
                    }
                    info!(stats = %stats.snapshot(), queued = queue.len(), "progress");
                }
                let _ = done_tx.send("reporter");
            })
            .expect("failed to spawn reporter thread");
    }

    /// Process every image in one folder synchronously and return the
    /// aggregate counts, bypassing the continuous loops entirely.
    pub fn run_batch(&self, folder: &Path, recursive: bool) -> Result<BatchReport> {
        self.run_batch_with_progress(folder, recursive, |_| {})
    }

    /// Batch run with a per-file progress callback (drives the CLI progress
    /// bar).
    pub fn run_batch_with_progress(
        &self,
        folder: &Path,
        recursive: bool,
        mut progress: impl FnMut(BatchProgress<'_>),
    ) -> Result<BatchReport> {
        if !folder.exists() {
            return Err(ScanError::DirectoryNotFound {
                path: folder.to_path_buf(),
            }
            .into());
        }
        if !folder.is_dir() {
            return Err(ScanError::NotADirectory {
                path: folder.to_path_buf(),
            }
            .into());
        }

        let store: Arc<dyn HashStore> = Arc::new(SqliteStore::open(&self.config.store_path)?);

        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            IntakeError::Startup(format!(
                "cannot create output directory {}: {e}",
                self.config.output_dir.display()
            ))
        })?;

        let files = collect_files(folder, recursive, &ImageValidator::new(), false);
        let total = files.len();
        info!(folder = %folder.display(), recursive, total, "batch run started");

        let processor = FileProcessor::new(store, self.config.output_dir.clone());
        let mut report = BatchReport::default();

        for (index, path) in files.iter().enumerate() {
            progress(BatchProgress {
                index: index + 1,
                total,
                path,
            });

            match processor.process(path) {
                Outcome::Stored { .. } => report.processed += 1,
                Outcome::DuplicateRemoved { .. } => report.duplicates += 1,
                Outcome::Skipped | Outcome::Vanished => report.skipped += 1,
                Outcome::Error(reason) => {
                    error!(path = %path.display(), %reason, "batch item failed");
                    report.errors += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            duplicates = report.duplicates,
            skipped = report.skipped,
            errors = report.errors,
            "batch run complete"
        );
        Ok(report)
    }
}

/// Aggregate counts from one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: u64,
    pub duplicates: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Position within a batch run, handed to the progress callback
#[derive(Debug)]
pub struct BatchProgress<'a> {
    /// 1-based index of the current file
    pub index: usize,
    pub total: usize,
    pub path: &'a Path,
}
