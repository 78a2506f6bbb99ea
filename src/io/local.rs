use super::ByteSource;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Local archive file opened for sequential reading
pub struct LocalFileSource {
    file: tokio::fs::File,
}

impl LocalFileSource {
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self {
            file: tokio::fs::File::from_std(file),
        })
    }
}

#[async_trait]
impl ByteSource for LocalFileSource {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf).await
    }
}
