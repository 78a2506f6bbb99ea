use log::{debug, info, warn};
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::{GmaError, Result};
use crate::io::{ByteSource, LocalFileSource};

use super::cursor::ArchiveCursor;
use super::descriptor::write_descriptor;
use super::parser::{parse_header, read_file_table};
use super::structures::*;

/// Directory name used when nothing of the addon name survives sanitizing
const FALLBACK_ADDON_DIR: &str = "addon";

/// Lifecycle of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    Idle,
    ReadingHeader,
    ReadingTable,
    Extracting,
    WritingMetadata,
    Done,
    Cancelled,
    Failed,
}

/// Strip characters the target filesystem rejects from an addon name.
///
/// Windows rules are applied on every platform so an extraction made on
/// Linux can be copied to a Windows install unchanged.
pub fn sanitize_addon_name(name: &str) -> String {
    let options = sanitize_filename::Options {
        windows: true,
        truncate: true,
        replacement: "",
    };
    let cleaned = sanitize_filename::sanitize_with_options(name, options);

    if cleaned.trim().is_empty() {
        FALLBACK_ADDON_DIR.to_string()
    } else {
        cleaned
    }
}

/// GMAD archive extractor
///
/// Runs once: header, file table, entry contents in table order, then the
/// `addon.txt` descriptor. Every error aborts the whole operation and files
/// written before it are left on disk.
pub struct GmaExtractor<S: ByteSource> {
    cursor: ArchiveCursor<S>,
    options: ExtractOptions,
    state: ExtractState,
}

impl<S: ByteSource> GmaExtractor<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, ExtractOptions::default())
    }

    pub fn with_options(source: S, options: ExtractOptions) -> Self {
        Self {
            cursor: ArchiveCursor::new(source),
            options,
            state: ExtractState::Idle,
        }
    }

    pub fn state(&self) -> ExtractState {
        self.state
    }

    fn transition(&mut self, next: ExtractState) {
        debug!("Extraction state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state != ExtractState::Idle {
            return Err(GmaError::Io(io::Error::other(format!(
                "extractor already used (state {:?})",
                self.state
            ))));
        }
        Ok(())
    }

    fn finish<T>(&mut self, result: &Result<T>, success: ExtractState) {
        let next = match result {
            Ok(_) => success,
            Err(GmaError::Cancelled) => ExtractState::Cancelled,
            Err(_) => ExtractState::Failed,
        };
        self.transition(next);
    }

    /// Read the header and file table without extracting anything
    pub async fn list(&mut self) -> Result<(AddonMetadata, Vec<FileEntry>)> {
        self.ensure_idle()?;

        let result = self.read_index().await;
        self.finish(&result, ExtractState::Done);
        result
    }

    async fn read_index(&mut self) -> Result<(AddonMetadata, Vec<FileEntry>)> {
        self.transition(ExtractState::ReadingHeader);
        let metadata = parse_header(&mut self.cursor).await?;

        self.transition(ExtractState::ReadingTable);
        let entries = read_file_table(&mut self.cursor).await?;

        Ok((metadata, entries))
    }

    /// Extract the archive into `output_root/<sanitized addon name>/`.
    ///
    /// `progress` is called synchronously after each completed entry.
    /// `token` is observed before each entry and around every read and
    /// write of the copy loop.
    ///
    /// # Errors
    ///
    /// - [`GmaError::InvalidFormat`] for a bad signature; nothing is created
    /// - [`GmaError::EmptyTable`] when the archive lists no files; nothing is created
    /// - [`GmaError::Truncated`] when content ends early
    /// - [`GmaError::Cancelled`] when `token` fires
    /// - [`GmaError::Io`] for filesystem failures
    pub async fn extract<P>(
        &mut self,
        output_root: &Path,
        token: &CancellationToken,
        mut progress: P,
    ) -> Result<ExtractSummary>
    where
        P: FnMut(&ExtractProgress) + Send,
    {
        self.ensure_idle()?;

        let result = self.run(output_root, token, &mut progress).await;
        self.finish(&result, ExtractState::Done);

        match &result {
            Ok(summary) => info!(
                "Extracted {} files ({} bytes) to {}",
                summary.files,
                summary.bytes,
                summary.addon_dir.display()
            ),
            Err(e) => debug!("Extraction stopped: {e}"),
        }
        result
    }

    async fn run<P>(
        &mut self,
        output_root: &Path,
        token: &CancellationToken,
        progress: &mut P,
    ) -> Result<ExtractSummary>
    where
        P: FnMut(&ExtractProgress) + Send,
    {
        if token.is_cancelled() {
            return Err(GmaError::Cancelled);
        }

        let (metadata, entries) = self.read_index().await?;

        self.transition(ExtractState::Extracting);
        let addon_dir = output_root.join(sanitize_addon_name(&metadata.name));
        fs::create_dir_all(&addon_dir).await?;

        let mut progress_state = ExtractProgress {
            total_files: entries.len(),
            ..Default::default()
        };
        let mut buffer = vec![0u8; self.options.buffer_size.max(1)];
        let mut bytes = 0u64;

        for (i, entry) in entries.iter().enumerate() {
            if token.is_cancelled() {
                return Err(GmaError::Cancelled);
            }

            if entry.is_suspicious_path() {
                if self.options.reject_unsafe_paths {
                    return Err(GmaError::InvalidFormat(format!(
                        "entry path escapes the addon directory: {:?}",
                        entry.path
                    )));
                }
                warn!("Entry path may escape the addon directory: {:?}", entry.path);
            }

            let full_path = addon_dir.join(&entry.path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).await?;
            }

            debug!("Extracting {} ({} bytes)", entry.path, entry.size);

            // Flush on every path so a partial file is settled on disk
            // before an error or cancellation is reported
            let mut out = open_exclusive(&full_path).await?;
            let copied = self.copy_entry(entry, &mut out, &mut buffer, token).await;
            let flushed = out.flush().await;
            drop(out);
            copied?;
            flushed?;

            bytes += entry.size as u64;
            progress_state.files_processed = i + 1;
            progress_state.current_file.clone_from(&entry.path);
            progress(&progress_state);
        }

        if token.is_cancelled() {
            return Err(GmaError::Cancelled);
        }

        self.transition(ExtractState::WritingMetadata);
        write_descriptor(&addon_dir, &metadata).await?;

        Ok(ExtractSummary {
            metadata,
            addon_dir,
            files: entries.len(),
            bytes,
        })
    }

    /// Copy exactly `entry.size` bytes from the archive into `out`
    async fn copy_entry(
        &mut self,
        entry: &FileEntry,
        out: &mut fs::File,
        buffer: &mut [u8],
        token: &CancellationToken,
    ) -> Result<()> {
        let size = entry.size as u64;
        let mut remaining = size;

        while remaining > 0 {
            let want = (buffer.len() as u64).min(remaining) as usize;

            let read = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(GmaError::Cancelled),
                read = self.cursor.read(&mut buffer[..want]) => read?,
            };

            if read == 0 {
                return Err(GmaError::Truncated(format!(
                    "{}: stream ended after {} of {} bytes",
                    entry.path,
                    size - remaining,
                    size
                )));
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(GmaError::Cancelled),
                written = out.write_all(&buffer[..read]) => written?,
            }

            remaining -= read as u64;
        }

        Ok(())
    }
}

/// Create or truncate `path`, denying other handles on platforms that allow it
async fn open_exclusive(path: &Path) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(windows)]
    options.share_mode(0);

    options.open(path).await
}

/// Extract a local archive file.
///
/// The archive is opened here and closed when extraction returns, on every
/// exit path.
pub async fn extract_file<P>(
    archive: &Path,
    output_root: &Path,
    token: &CancellationToken,
    progress: P,
) -> Result<ExtractSummary>
where
    P: FnMut(&ExtractProgress) + Send,
{
    let source = LocalFileSource::new(archive)?;
    GmaExtractor::new(source)
        .extract(output_root, token, progress)
        .await
}
