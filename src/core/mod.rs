//! # Core Pipeline
//!
//! The intake engine: scanning, queueing, validation, hashing, the record
//! store, per-file processing, statistics, and the supervisor that wires
//! them together.

pub mod hasher;
pub mod processor;
pub mod queue;
pub mod scanner;
pub mod stats;
pub mod store;
pub mod supervisor;
pub mod validator;
