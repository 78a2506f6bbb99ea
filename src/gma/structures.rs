use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use std::path::PathBuf;

use crate::error::{GmaError, Result};

/// Archive signature, the ASCII bytes `GMAD`
pub const SIGNATURE: &[u8; 4] = b"GMAD";

/// Format version, author identity and timestamp; not needed for extraction
pub const HEADER_RESERVED_LEN: u64 = 18;

/// Addon version following the author string
pub const ADDON_VERSION_LEN: u64 = 4;

/// Longest metadata or path string accepted before the archive is rejected
pub const MAX_STRING_LEN: usize = 64 * 1024;

/// Default size of the reusable copy buffer
pub const DEFAULT_BUFFER_SIZE: usize = 80 * 1024;

/// Name of the generated descriptor file
pub const DESCRIPTOR_FILE_NAME: &str = "addon.txt";

/// Addon metadata stored in the archive header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonMetadata {
    pub name: String,
    pub description: String,
    pub author: String,
}

/// Size and reserved fields following an entry's path - 12 bytes
pub struct EntryTrailer {
    pub size: u32,
    /// Per-entry checksum and flags, carried but never checked
    pub reserved: u64,
}

impl EntryTrailer {
    pub const SIZE: usize = 12;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(GmaError::Truncated("file table entry".to_string()));
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            size: cursor.read_u32::<LittleEndian>()?,
            reserved: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// One record of the file table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File index as stored; not validated for order or uniqueness
    pub index: u32,
    /// Relative path exactly as stored in the archive
    pub path: String,
    pub size: u32,
}

impl FileEntry {
    /// Whether the stored path could escape the addon directory when joined
    pub fn is_suspicious_path(&self) -> bool {
        let path = self.path.replace('\\', "/");
        path.starts_with('/')
            || path.split('/').any(|part| part == "..")
            || path.as_bytes().get(1) == Some(&b':')
    }
}

/// Progress snapshot handed to the caller after each completed entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractProgress {
    pub total_files: usize,
    pub files_processed: usize,
    pub current_file: String,
}

/// Result of a successful extraction
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub metadata: AddonMetadata,
    pub addon_dir: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

/// Tuning knobs for a single extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub buffer_size: usize,
    /// Refuse entries whose path is absolute or climbs out with `..`
    pub reject_unsafe_paths: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            reject_unsafe_paths: false,
        }
    }
}

/// Coarse outcome of an extraction, with a stable numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    InvalidFormat,
    EmptyTable,
    Truncated,
    Cancelled,
    IoFailure,
}

impl Outcome {
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Self::from_error(e),
        }
    }

    pub fn from_error(error: &GmaError) -> Self {
        match error {
            GmaError::InvalidFormat(_) => Outcome::InvalidFormat,
            GmaError::EmptyTable => Outcome::EmptyTable,
            GmaError::Truncated(_) => Outcome::Truncated,
            GmaError::Cancelled => Outcome::Cancelled,
            GmaError::Io(_) | GmaError::Http(_) => Outcome::IoFailure,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::InvalidFormat => 1,
            Outcome::EmptyTable => 2,
            Outcome::Truncated => 3,
            Outcome::Cancelled => 4,
            Outcome::IoFailure => 5,
        }
    }
}
