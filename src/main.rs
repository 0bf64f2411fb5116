//! # image-intake CLI
//!
//! Command-line interface for the image intake pipeline.
//!
//! ## Usage
//! ```bash
//! image-intake watch ~/incoming --output ~/deduped
//! image-intake batch ~/photos --format json
//! ```

mod cli;

use image_intake::Result;

fn main() -> Result<()> {
    cli::run()
}
