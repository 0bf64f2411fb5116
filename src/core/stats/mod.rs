//! # Statistics Module
//!
//! Process-wide counters for the continuous pipeline, updated under a single
//! mutex by whichever worker finished an item. Reset on every start.

use crate::core::processor::Outcome;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Default)]
struct Counters {
    processed: u64,
    duplicates: u64,
    moved: u64,
    errors: u64,
    start_time: Option<Instant>,
}

/// Shared counters; all mutation goes through the internal mutex.
pub struct Statistics {
    inner: Mutex<Counters>,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counters::default()),
        }
    }

    /// Zero every counter and restart the clock
    pub fn reset(&self) {
        let mut counters = self.inner.lock().unwrap();
        *counters = Counters {
            start_time: Some(Instant::now()),
            ..Counters::default()
        };
    }

    /// Record one terminal outcome.
    ///
    /// Skipped files count as processed (they were handled, not failed);
    /// vanished files count as nothing, matching how the pipeline has always
    /// reported them. Relocations bump both `processed` and `moved`.
    pub fn record(&self, outcome: &Outcome) {
        let mut counters = self.inner.lock().unwrap();
        match outcome {
            Outcome::Stored { .. } => {
                counters.processed += 1;
                counters.moved += 1;
            }
            Outcome::Skipped => counters.processed += 1,
            Outcome::DuplicateRemoved { .. } => counters.duplicates += 1,
            Outcome::Error(_) => counters.errors += 1,
            Outcome::Vanished => {}
        }
    }

    /// Consistent point-in-time copy of all counters
    pub fn snapshot(&self) -> Snapshot {
        let counters = self.inner.lock().unwrap();
        Snapshot {
            processed: counters.processed,
            duplicates: counters.duplicates,
            moved: counters.moved,
            errors: counters.errors,
            elapsed_secs: counters
                .start_time
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Snapshot {
    pub processed: u64,
    pub duplicates: u64,
    pub moved: u64,
    pub errors: u64,
    pub elapsed_secs: f64,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} duplicates={} moved={} errors={} elapsed={:.1}s",
            self.processed, self.duplicates, self.moved, self.errors, self.elapsed_secs
        )
    }
}
