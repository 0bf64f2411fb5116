//! # Validator Module
//!
//! Format checks and lightweight metadata probing for image files.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - GIF (.gif)
//! - BMP (.bmp)
//! - TIFF (.tiff, .tif)
//! - WebP (.webp)
//!
//! Validation sniffs the file header and reads dimensions without decoding
//! pixel data, so corrupt and zero-byte files are rejected cheaply.

use crate::error::ValidateError;
use image::ImageReader;
use std::collections::HashSet;
use std::path::Path;

/// Extensions accepted by default, lowercase
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];

/// Basic image metadata extracted from the file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Sniffed format name, e.g. "Png"
    pub format: String,
}

/// Validates image files by extension and header sniff
pub struct ImageValidator {
    extensions: HashSet<String>,
}

impl ImageValidator {
    /// Create a validator accepting the default extension set
    pub fn new() -> Self {
        Self {
            extensions: SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }

    /// Override the accepted extension set
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Check an extension against the supported set, case-insensitively
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        self.extensions.contains(&ext.to_lowercase())
    }

    /// Check whether a path carries a supported extension
    pub fn is_supported_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.is_supported_extension(e))
            .unwrap_or(false)
    }

    /// Sniff the header and return basic metadata.
    ///
    /// Reads only as much of the file as needed to determine format and
    /// dimensions. Zero-byte files, unrecognized headers, and truncated
    /// headers all fail here.
    pub fn probe(&self, path: &Path) -> Result<ImageInfo, ValidateError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if !self.is_supported_extension(ext) {
            return Err(ValidateError::UnsupportedFormat {
                extension: ext.to_string(),
            });
        }

        let reader = ImageReader::open(path)
            .map_err(|e| ValidateError::Io {
                path: path.to_path_buf(),
                source: e,
            })?
            .with_guessed_format()
            .map_err(|e| ValidateError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let format = reader
            .format()
            .ok_or_else(|| ValidateError::InvalidImage {
                path: path.to_path_buf(),
                reason: "unrecognized image header".to_string(),
            })?;

        let (width, height) =
            reader
                .into_dimensions()
                .map_err(|e| ValidateError::InvalidImage {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;

        Ok(ImageInfo {
            width,
            height,
            format: format!("{format:?}"),
        })
    }

    /// True when the file probes as a valid image
    pub fn validate(&self, path: &Path) -> bool {
        match self.probe(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "image validation failed");
                false
            }
        }
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal valid 1x1 PNG, shared by unit tests across the crate
#[cfg(test)]
pub(crate) const TINY_PNG: [u8; 69] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG header
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8, 0xFF, 0xFF, 0x3F, 0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC,
    0xCC, 0x59, 0xE7, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];
