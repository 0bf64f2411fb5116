//! # Configuration Module
//!
//! Explicit, typed configuration for the intake pipeline.
//!
//! Every setting has a documented default, and [`Config::from_env`] reads the
//! environment variables the application has historically honoured:
//!
//! | Variable        | Meaning                                  | Default            |
//! |-----------------|------------------------------------------|--------------------|
//! | `SCAN_PATHS`    | Comma-separated directories to watch     | `./incoming`       |
//! | `OUTPUT_DIR`    | Destination for unique images            | `./deduped`        |
//! | `SCAN_INTERVAL` | Seconds between scan passes              | `5`                |
//! | `STORE_PATH`    | SQLite record store location             | platform data dir  |
//! | `LOG_LEVEL`     | Tracing filter level                     | `info`             |
//!
//! CLI flags override environment values; the CLI layer applies them on top
//! of whatever `from_env` produced.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the scan/dedup/relocate pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Directories to watch for incoming images
    pub scan_roots: Vec<PathBuf>,
    /// Whether scan roots are walked recursively
    pub recursive: bool,
    /// Directory unique images are moved into
    pub output_dir: PathBuf,
    /// Pause between scan passes
    pub scan_interval: Duration,
    /// Number of processing workers pulling from the queue
    pub workers: usize,
    /// Location of the SQLite record store
    pub store_path: PathBuf,
    /// Tracing filter level (`trace`..`error`)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_roots: vec![PathBuf::from("./incoming")],
            recursive: true,
            output_dir: PathBuf::from("./deduped"),
            scan_interval: Duration::from_secs(5),
            workers: 1,
            store_path: Self::default_store_path(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(paths) = env::var("SCAN_PATHS") {
            let roots: Vec<PathBuf> = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
            if !roots.is_empty() {
                config.scan_roots = roots;
            }
        }

        if let Ok(dir) = env::var("OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                config.output_dir = PathBuf::from(dir.trim());
            }
        }

        if let Ok(interval) = env::var("SCAN_INTERVAL") {
            if let Ok(secs) = interval.trim().parse::<u64>() {
                config.scan_interval = Duration::from_secs(secs);
            }
        }

        if let Ok(path) = env::var("STORE_PATH") {
            if !path.trim().is_empty() {
                config.store_path = PathBuf::from(path.trim());
            }
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            if !level.trim().is_empty() {
                config.log_level = level.trim().to_lowercase();
            }
        }

        config
    }

    /// Default record store location under the platform data directory
    pub fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("image-intake")
            .join("records.db")
    }
}
