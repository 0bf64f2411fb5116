//! # Hasher Module
//!
//! Content digests for dedup keys.
//!
//! Two byte-identical files always produce the same digest, no matter how the
//! bytes were read; the digest depends on content only, never on path, name,
//! or chunking. BLAKE3 is cryptographic, so digest equality is treated as
//! content equality throughout the pipeline.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Algorithm label persisted alongside every record
pub const HASH_ALGORITHM: &str = "blake3";

/// Read buffer size for file hashing
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the content digest of a file as a lowercase hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute the content digest of an in-memory buffer.
///
/// Used by tests to cross-check [`hash_file`]; both must agree for the same
/// bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn identical_content_yields_identical_digest() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.bin", b"same bytes");
        let b = write_file(&dir, "b.bin", b"same bytes");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn different_content_yields_different_digest() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.bin", b"some bytes");
        let b = write_file(&dir, "b.bin", b"other bytes");

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn chunked_read_matches_whole_buffer() {
        // Larger than the read buffer so hash_file takes multiple chunks
        let content: Vec<u8> = (0..READ_BUFFER_SIZE * 3 + 17)
            .map(|i| (i % 251) as u8)
            .collect();

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "big.bin", &content);

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&content));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let result = hash_file(&dir.path().join("missing.bin"));
        assert!(result.is_err());
    }
}
