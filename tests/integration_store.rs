//! Integration tests for dedup under concurrency.
//!
//! Two workers racing the same content must resolve to exactly one stored
//! record; the loser sees the unique-constraint violation and treats the
//! file as a duplicate.

use image_intake::core::processor::{FileProcessor, Outcome};
use image_intake::core::store::{HashStore, SqliteStore};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
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

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(&TINY_PNG).unwrap();
    path
}

#[test]
fn racing_workers_store_identical_content_exactly_once() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    let output = dir.path().join("output");
    fs::create_dir_all(&incoming).unwrap();
    fs::create_dir_all(&output).unwrap();

    // Two files with byte-identical content
    let first = write_png(&incoming, "one.png");
    let second = write_png(&incoming, "two.png");

    let store: Arc<dyn HashStore> =
        Arc::new(SqliteStore::open(&dir.path().join("records.db")).unwrap());
    let processor = Arc::new(FileProcessor::new(Arc::clone(&store), output.clone()));

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for path in [first, second] {
        let processor = Arc::clone(&processor);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            processor.process(&path)
        }));
    }

    let outcomes: Vec<Outcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let stored = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Stored { .. }))
        .count();
    let removed = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::DuplicateRemoved { .. }))
        .count();
    let errors = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Error(_)))
        .count();

    assert_eq!(stored, 1, "exactly one worker wins the insert");
    assert_eq!(removed, 1, "the loser deletes its copy as a duplicate");
    assert_eq!(errors, 0, "a lost race is not an error");

    // One record, one file in the output, nothing left in the incoming dir
    assert_eq!(store.statistics().unwrap().total, 1);
    let stored_files: Vec<_> = fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(stored_files.len(), 1);
    assert!(fs::read_dir(&incoming).unwrap().next().is_none());
}

#[test]
fn store_survives_reopen_between_processors() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join("incoming");
    let output = dir.path().join("output");
    fs::create_dir_all(&incoming).unwrap();
    fs::create_dir_all(&output).unwrap();
    let db_path = dir.path().join("records.db");

    {
        let store: Arc<dyn HashStore> = Arc::new(SqliteStore::open(&db_path).unwrap());
        let processor = FileProcessor::new(store, output.clone());
        let path = write_png(&incoming, "keep.png");
        assert!(matches!(processor.process(&path), Outcome::Stored { .. }));
    }

    // Fresh handle over the same database; same content is now a duplicate
    let store: Arc<dyn HashStore> = Arc::new(SqliteStore::open(&db_path).unwrap());
    let processor = FileProcessor::new(Arc::clone(&store), output);
    let path = write_png(&incoming, "again.png");

    assert_eq!(
        processor.process(&path),
        Outcome::DuplicateRemoved {
            existing_name: "keep.png".to_string()
        }
    );
    assert_eq!(store.statistics().unwrap().total, 1);
}
