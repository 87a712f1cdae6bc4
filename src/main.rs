//! # video-dedup CLI
//!
//! Command-line interface for the duplicate video cleaner.
//!
//! ## Usage
//! ```bash
//! video-dedup scan ~/Videos
//! video-dedup clean ~/Videos --cleanup ~/Videos-duplicates --output json
//! ```

mod cli;

use duplicate_video_cleaner::Result;

fn main() -> Result<()> {
    cli::run()
}
