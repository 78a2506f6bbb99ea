//! # gmadx
//!
//! A streaming extractor for GMAD (`.gma`) addon archives.
//!
//! The archive is read front to back exactly once: the header, then the
//! file table, then every entry's content copied straight to disk. Each
//! completed file is reported through a progress callback, and a
//! [`CancellationToken`] can stop the extraction between files or in the
//! middle of one.
//!
//! ## Features
//!
//! - Extract GMAD archives from the local filesystem or an HTTP/HTTPS URL
//! - Windows-1252 metadata and paths decoded faithfully
//! - Progress callback with no threading assumptions
//! - Cooperative cancellation at chunk granularity
//! - Typed outcomes distinguishing bad format, empty archives, truncation
//!   and cancellation
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use gmadx::{CancellationToken, extract_file};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let token = CancellationToken::new();
//!     let summary = extract_file(
//!         Path::new("addon.gma"),
//!         Path::new("out"),
//!         &token,
//!         |p| println!("{}/{} {}", p.files_processed, p.total_files, p.current_file),
//!     )
//!     .await?;
//!
//!     println!("extracted to {}", summary.addon_dir.display());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod gma;
pub mod io;

pub use cli::Cli;
pub use error::{GmaError, Result};
pub use gma::{
    AddonMetadata, ExtractOptions, ExtractProgress, ExtractState, ExtractSummary, FileEntry,
    GmaExtractor, Outcome, extract_file,
};
pub use io::{ByteSource, HttpStreamSource, LocalFileSource, MemorySource};
pub use tokio_util::sync::CancellationToken;
