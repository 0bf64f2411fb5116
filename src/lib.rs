//! # Image Intake
//!
//! A watch-and-deduplicate pipeline for incoming images.
//!
//! ## How it works
//! Configured directories are scanned on a fixed interval. Every candidate
//! image is hashed, checked against a persistent record store, and then
//! either deleted (content already known) or moved into the output directory
//! under a collision-free name. The store's unique constraint on the content
//! digest is the source of truth, so concurrent workers never store the same
//! content twice.
//!
//! ## Architecture
//! - `core` - The scan/hash/dedup/relocate engine and its supervisor
//! - `config` - Typed settings with environment-variable fallbacks
//! - `error` - Per-subsystem error types
//! - `cli` lives in the binary; the library is interface-agnostic

pub mod config;
pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{IntakeError, Result};

/// Initialize tracing for the library
///
/// This should be called once by the application entry point. `RUST_LOG`
/// wins when set; otherwise `level` is used as the filter.
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
