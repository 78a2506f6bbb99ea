//! Buffered forward-only cursor over a [`ByteSource`].
//!
//! The archive is consumed in a single pass: fixed fields are read with
//! [`ArchiveCursor::read_exact`], reserved regions are discarded with
//! [`ArchiveCursor::skip`] and NUL-terminated strings are scanned out of
//! the internal buffer. Nothing ever seeks backwards.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;

use crate::error::{GmaError, Result};
use crate::io::ByteSource;

use super::structures::MAX_STRING_LEN;

const CURSOR_BUFFER_SIZE: usize = 8 * 1024;

pub struct ArchiveCursor<S: ByteSource> {
    source: S,
    buf: Box<[u8]>,
    start: usize,
    end: usize,
    position: u64,
}

impl<S: ByteSource> ArchiveCursor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: vec![0u8; CURSOR_BUFFER_SIZE].into_boxed_slice(),
            start: 0,
            end: 0,
            position: 0,
        }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Refill the internal buffer if it is drained; returns the bytes available
    async fn fill(&mut self) -> Result<usize> {
        if self.start == self.end {
            self.start = 0;
            self.end = self.source.read(&mut self.buf).await?;
        }
        Ok(self.end - self.start)
    }

    fn consume(&mut self, n: usize) {
        self.start += n;
        self.position += n as u64;
    }

    /// Read up to `out.len()` bytes, returning `0` only at end of stream
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        // Large reads bypass the internal buffer once it is drained
        if self.start == self.end && out.len() >= self.buf.len() {
            let n = self.source.read(out).await?;
            self.position += n as u64;
            return Ok(n);
        }

        let available = self.fill().await?;
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.buf[self.start..self.start + n]);
        self.consume(n);
        Ok(n)
    }

    /// Fill `out` completely or fail with [`GmaError::Truncated`]
    pub async fn read_exact(&mut self, out: &mut [u8], what: &str) -> Result<()> {
        let mut filled = 0;
        while filled < out.len() {
            let n = self.read(&mut out[filled..]).await?;
            if n == 0 {
                return Err(GmaError::Truncated(format!(
                    "{what}: expected {} bytes at offset {}, stream ended after {}",
                    out.len(),
                    self.position - filled as u64,
                    filled
                )));
            }
            filled += n;
        }
        Ok(())
    }

    pub async fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, what).await?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// Discard `count` bytes
    pub async fn skip(&mut self, count: u64, what: &str) -> Result<()> {
        let mut remaining = count;
        while remaining > 0 {
            let available = self.fill().await?;
            if available == 0 {
                return Err(GmaError::Truncated(format!(
                    "{what}: {remaining} of {count} reserved bytes missing"
                )));
            }
            let n = (available as u64).min(remaining) as usize;
            self.consume(n);
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Read a NUL-terminated Windows-1252 string, consuming the terminator
    pub async fn read_cstring(&mut self, what: &str) -> Result<String> {
        let mut bytes = Vec::new();

        loop {
            let available = self.fill().await?;
            if available == 0 {
                return Err(GmaError::Truncated(format!(
                    "{what}: stream ended before string terminator"
                )));
            }

            let window = &self.buf[self.start..self.end];
            let (take, terminated) = match window.iter().position(|&b| b == 0) {
                Some(nul) => (nul, true),
                None => (window.len(), false),
            };

            if bytes.len() + take > MAX_STRING_LEN {
                return Err(GmaError::InvalidFormat(format!(
                    "{what} exceeds {MAX_STRING_LEN} bytes"
                )));
            }

            bytes.extend_from_slice(&window[..take]);
            if terminated {
                self.consume(take + 1);
                break;
            }
            self.consume(take);
        }

        let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(&bytes);
        Ok(text.into_owned())
    }
}
