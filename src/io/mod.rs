//! Forward-only byte sources an archive can be streamed from.

mod http;
mod local;
mod memory;

pub use http::HttpStreamSource;
pub use local::LocalFileSource;
pub use memory::MemorySource;

use async_trait::async_trait;
use std::io;

/// Trait for sequential reading from a data source
#[async_trait]
pub trait ByteSource: Send {
    /// Read up to `buf.len()` bytes, returning `0` at end of stream
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}
