//! Integration tests for batch runs.
//!
//! These tests verify end-to-end batch behavior including:
//! - Unique images stored, byte-identical copies removed
//! - Zero-byte and mislabelled files
//! - Empty and nonexistent folders

use image_intake::config::Config;
use image_intake::core::supervisor::Supervisor;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A minimal valid 1x1 PNG
const TINY_PNG: [u8; 69] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG header
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8, 0xFF, 0xFF, 0x3F, 0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC,
    0xCC, 0x59, 0xE7, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn test_config(dir: &TempDir) -> Config {
    Config {
        scan_roots: vec![],
        recursive: true,
        output_dir: dir.path().join("output"),
        scan_interval: Duration::from_millis(50),
        workers: 1,
        store_path: dir.path().join("records.db"),
        log_level: "warn".to_string(),
    }
}

/// Write a PNG whose content is TINY_PNG plus trailing bytes; the header
/// stays valid while the digest varies
fn write_png(dir: &Path, name: &str, extra: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(&TINY_PNG).unwrap();
    file.write_all(extra).unwrap();
    path
}

#[test]
fn batch_stores_unique_and_removes_duplicates() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();

    write_png(&incoming, "a.png", b"one");
    write_png(&incoming, "b.png", b"two");
    write_png(&incoming, "c.png", b"three");
    // Byte-identical to a.png, different name
    write_png(&incoming, "a-copy.png", b"one");

    let supervisor = Supervisor::new(test_config(&dir));
    let report = supervisor.run_batch(&incoming, true).unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.errors, 0);

    // Three unique files in the output, the duplicate gone from disk
    let stored: Vec<_> = fs::read_dir(dir.path().join("output"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(stored.len(), 3);
    assert!(fs::read_dir(&incoming).unwrap().next().is_none());
}

#[test]
fn batch_skips_empty_and_accepts_mislabelled_files() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();

    // Zero bytes, never hashed
    File::create(incoming.join("x.png")).unwrap();
    // PNG bytes behind a .jpg name; format sniffing reads the content
    write_png(&incoming, "y.jpg", b"");

    let supervisor = Supervisor::new(test_config(&dir));
    let report = supervisor.run_batch(&incoming, true).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errors, 0);
    assert!(dir.path().join("output").join("y.jpg").exists());
    assert!(incoming.join("x.png").exists(), "skipped files stay put");
}

#[test]
fn batch_ignores_non_image_files() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();

    File::create(incoming.join("notes.txt"))
        .unwrap()
        .write_all(b"not an image")
        .unwrap();
    write_png(&incoming, "real.png", b"");

    let supervisor = Supervisor::new(test_config(&dir));
    let report = supervisor.run_batch(&incoming, true).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 0, "non-image extensions never enter the batch");
    assert!(incoming.join("notes.txt").exists());
}

#[test]
fn non_recursive_batch_ignores_subdirectories() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    let nested = incoming.join("nested");
    fs::create_dir_all(&nested).unwrap();

    write_png(&incoming, "top.png", b"top");
    write_png(&nested, "deep.png", b"deep");

    let supervisor = Supervisor::new(test_config(&dir));
    let report = supervisor.run_batch(&incoming, false).unwrap();

    assert_eq!(report.processed, 1);
    assert!(nested.join("deep.png").exists());
}

#[test]
fn batch_on_empty_folder_reports_all_zeroes() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();

    let supervisor = Supervisor::new(test_config(&dir));
    let report = supervisor.run_batch(&incoming, true).unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.errors, 0);
}

#[test]
fn batch_rejects_nonexistent_folder() {
    let dir = TempDir::new().unwrap();
    let supervisor = Supervisor::new(test_config(&dir));
    assert!(supervisor
        .run_batch(Path::new("/nonexistent/path/that/does/not/exist"), true)
        .is_err());
}

#[test]
fn duplicates_are_detected_across_batch_runs() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();

    write_png(&incoming, "first.png", b"same");
    let supervisor = Supervisor::new(test_config(&dir));
    let report = supervisor.run_batch(&incoming, true).unwrap();
    assert_eq!(report.processed, 1);

    // Same content arrives again later; the store remembers it
    write_png(&incoming, "second.png", b"same");
    let report = supervisor.run_batch(&incoming, true).unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.duplicates, 1);
}
