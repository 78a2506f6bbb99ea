//! GMAD archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`cursor`]: buffered forward-only reader over a [`ByteSource`](crate::io::ByteSource)
//! - [`parser`]: header and file table parsing
//! - [`extractor`]: streaming extraction, cancellation and the run state machine
//! - [`descriptor`]: the `addon.txt` sidecar
//! - [`structures`]: format constants and the types shared between them
//!
//! ## GMAD Format Overview
//!
//! A GMAD file consists of:
//! 1. The `GMAD` signature, a reserved block and three NUL-terminated
//!    Windows-1252 strings (name, description, author)
//! 2. A file table of (index, path, size) records ending with index `0`
//! 3. The content of every entry, back to back in table order
//!
//! Content has no offsets of its own, so the archive is always consumed
//! sequentially in a single pass.
//!
//! ## Limitations
//!
//! - No LZMA-compressed `.gma` support
//! - No archive creation

pub mod cursor;
pub mod descriptor;
pub mod extractor;
pub mod parser;
pub mod structures;

pub use descriptor::render_descriptor;
pub use extractor::{ExtractState, GmaExtractor, extract_file, sanitize_addon_name};
pub use structures::*;
