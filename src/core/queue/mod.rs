//! # Queue Module
//!
//! FIFO handoff between the directory scanner and the processing workers.
//!
//! The queue is unbounded: scan passes run on a fixed cadence, so the
//! producer can never outpace consumers for long, and downstream dedup makes
//! re-enqueued paths harmless. `len`/`is_empty` are advisory snapshots for
//! reporting and backoff only; they race with concurrent pushes and pops and
//! must never drive correctness decisions.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::time::Duration;

/// A discovered file awaiting processing.
///
/// The filesystem entry is the source of truth; the handle may be stale by
/// the time a worker picks it up, and workers tolerate that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedFile {
    pub path: PathBuf,
}

impl QueuedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Unbounded FIFO queue shared between scanner and workers.
///
/// Cloning is cheap; all clones share the same underlying channel.
#[derive(Clone)]
pub struct WorkQueue {
    tx: Sender<QueuedFile>,
    rx: Receiver<QueuedFile>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Enqueue a file. Never blocks.
    pub fn push(&self, item: QueuedFile) {
        // The queue holds its own receiver, so the channel cannot be
        // disconnected while any clone is alive
        let _ = self.tx.send(item);
    }

    /// Dequeue the next file, waiting up to `timeout`.
    ///
    /// Returns `None` on timeout so consumers can re-check cancellation
    /// between waits.
    pub fn pop(&self, timeout: Duration) -> Option<QueuedFile> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Advisory queue depth
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Advisory emptiness check
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
