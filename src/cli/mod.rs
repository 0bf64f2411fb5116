//! # CLI Module
//!
//! Command-line interface for the image intake pipeline.
//!
//! ## Usage
//! ```bash
//! # Watch directories and deduplicate continuously (Ctrl-C to stop)
//! image-intake watch ~/incoming --output ~/deduped
//!
//! # Multiple roots, faster scans, more workers
//! image-intake watch ~/camera ~/downloads --interval 2 --workers 4
//!
//! # One-shot run over a single folder
//! image-intake batch ~/photos
//!
//! # JSON report for scripting
//! image-intake batch ~/photos --format json
//! ```
//!
//! Flags override the `SCAN_PATHS`, `OUTPUT_DIR`, `SCAN_INTERVAL`,
//! `STORE_PATH` and `LOG_LEVEL` environment variables, which in turn
//! override the built-in defaults.

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_intake::config::Config;
use image_intake::core::supervisor::{BatchReport, Supervisor};
use image_intake::error::{IntakeError, Result};
use image_intake::init_tracing;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

/// Image Intake - watch, deduplicate and file incoming images
#[derive(Parser, Debug)]
#[command(name = "image-intake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch directories continuously until interrupted
    Watch {
        /// Directories to watch (falls back to SCAN_PATHS, then ./incoming)
        roots: Vec<PathBuf>,

        /// Destination directory for unique images
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds between scan passes
        #[arg(short, long)]
        interval: Option<u64>,

        /// Number of processing workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Record store database path
        #[arg(long)]
        store: Option<PathBuf>,

        /// Do not descend into subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Process one folder once and print a report
    Batch {
        /// Folder to process
        folder: PathBuf,

        /// Destination directory for unique images
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record store database path
        #[arg(long)]
        store: Option<PathBuf>,

        /// Do not descend into subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        format: OutputFormat,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            roots,
            output,
            interval,
            workers,
            store,
            no_recursive,
            log_level,
        } => {
            let mut config = Config::from_env();
            if !roots.is_empty() {
                config.scan_roots = roots;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(secs) = interval {
                config.scan_interval = Duration::from_secs(secs);
            }
            if let Some(workers) = workers {
                config.workers = workers.max(1);
            }
            if let Some(store) = store {
                config.store_path = store;
            }
            if no_recursive {
                config.recursive = false;
            }
            if let Some(level) = log_level {
                config.log_level = level;
            }

            init_tracing(&config.log_level);
            run_watch(config)
        }

        Commands::Batch {
            folder,
            output,
            store,
            no_recursive,
            format,
            log_level,
        } => {
            let mut config = Config::from_env();
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(store) = store {
                config.store_path = store;
            }
            if let Some(level) = log_level {
                config.log_level = level;
            }

            init_tracing(&config.log_level);
            run_batch(config, folder, !no_recursive, format)
        }
    }
}

/// Start the pipeline and block until Ctrl-C.
fn run_watch(config: Config) -> Result<()> {
    let term = Term::stderr();
    term.write_line(&format!(
        "{} {}",
        style("Image Intake").bold().cyan(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  watching {} root(s), output {}",
        config.scan_roots.len(),
        config.output_dir.display()
    ))
    .ok();
    term.write_line(&format!("  {}", style("press Ctrl-C to stop").dim()))
        .ok();
    term.write_line("").ok();

    let supervisor = Supervisor::new(config);
    supervisor.start()?;

    // Block until the signal handler fires
    let (tx, rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })
    .map_err(|e| IntakeError::Startup(format!("cannot install signal handler: {e}")))?;

    rx.recv().ok();
    term.write_line("").ok();

    supervisor.stop();

    let snap = supervisor.statistics();
    term.write_line(&format!(
        "{} {}",
        style("✓").green().bold(),
        style("Stopped").bold()
    ))
    .ok();
    term.write_line(&format!("  {snap}")).ok();

    Ok(())
}

/// Process one folder synchronously with a progress bar.
fn run_batch(config: Config, folder: PathBuf, recursive: bool, format: OutputFormat) -> Result<()> {
    let term = Term::stderr();

    let progress = if matches!(format, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let supervisor = Supervisor::new(config);
    let report = supervisor.run_batch_with_progress(&folder, recursive, |p| {
        if let Some(ref pb) = progress {
            pb.set_length(p.total as u64);
            pb.set_position(p.index as u64);
            pb.set_message(
                p.path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned(),
            );
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match format {
        OutputFormat::Pretty => print_pretty_report(&term, &report),
        OutputFormat::Json => print_json_report(&report),
    }

    if report.errors > 0 {
        process::exit(1);
    }
    Ok(())
}

fn print_pretty_report(term: &Term, report: &BatchReport) {
    term.write_line("").ok();
    term.write_line(&format!(
        "{} Batch Complete",
        style("✓").green().bold()
    ))
    .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} unique images stored",
        style(report.processed).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicates removed",
        style(report.duplicates).cyan()
    ))
    .ok();
    term.write_line(&format!("  {} skipped", style(report.skipped).dim()))
        .ok();

    if report.errors > 0 {
        term.write_line(&format!("  {} errors", style(report.errors).red().bold()))
            .ok();
    }
    term.write_line("").ok();
}

fn print_json_report(report: &BatchReport) {
    println!(
        "{}",
        serde_json::to_string_pretty(report).expect("report serializes")
    );
}
