use async_trait::async_trait;
use log::warn;
use reqwest::{Client, Response, StatusCode};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ByteSource;
use crate::error::{GmaError, Result};

/// Streams a remote archive over a single HTTP GET
///
/// A dropped connection fails the read by default. With
/// [`with_resume_retries`](Self::with_resume_retries) and a server that
/// advertises Range support, the stream instead resumes from the current
/// position with a `Range: bytes=<pos>-` request.
pub struct HttpStreamSource {
    client: Client,
    url: String,
    response: Option<Response>,
    pending: Vec<u8>,
    pending_pos: usize,
    position: u64,
    resumable: bool,
    finished: bool,
    transferred_bytes: Arc<AtomicU64>,
    max_retry: u32,
}

impl HttpStreamSource {
    /// Create a new HTTP stream source
    ///
    /// This sends the GET request immediately so a bad URL or status
    /// fails before any extraction begins.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let resp = client.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(GmaError::Io(io::Error::other(format!(
                "HTTP request failed with status: {}",
                resp.status()
            ))));
        }

        let resumable = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));

        Ok(Self {
            client,
            url,
            response: Some(resp),
            pending: Vec::new(),
            pending_pos: 0,
            position: 0,
            resumable,
            finished: false,
            transferred_bytes: Arc::new(AtomicU64::new(0)),
            max_retry: 0,
        })
    }

    /// Allow up to `max_retry` Range resumes after a dropped connection
    pub fn with_resume_retries(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Whether a dropped connection will be resumed rather than failing
    pub fn resumes(&self) -> bool {
        self.resumable && self.max_retry > 0
    }

    /// Shared handle to the network transfer counter, usable after the source is moved
    pub fn transfer_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.transferred_bytes)
    }

    async fn resume(&self) -> io::Result<Response> {
        let range = format!("bytes={}-", self.position);
        let resp = self
            .client
            .get(&self.url)
            .header("Range", &range)
            .send()
            .await
            .map_err(io::Error::other)?;

        if resp.status() != StatusCode::PARTIAL_CONTENT {
            return Err(io::Error::other(format!(
                "HTTP resume failed with status: {}",
                resp.status()
            )));
        }
        Ok(resp)
    }

    async fn next_chunk(&mut self) -> io::Result<bool> {
        let mut retry_count = 0;

        loop {
            let result = match self.response.as_mut() {
                Some(resp) => resp.chunk().await,
                None => {
                    self.response = Some(self.resume().await?);
                    continue;
                }
            };

            match result {
                Ok(Some(chunk)) => {
                    self.pending.clear();
                    self.pending.extend_from_slice(&chunk);
                    self.pending_pos = 0;
                    self.transferred_bytes
                        .fetch_add(chunk.len() as u64, Ordering::Relaxed);
                    return Ok(true);
                }
                Ok(None) => {
                    self.finished = true;
                    self.response = None;
                    return Ok(false);
                }
                Err(e) if self.resumes() && (e.is_timeout() || e.is_body() || e.is_connect()) => {
                    retry_count += 1;
                    if retry_count > self.max_retry {
                        return Err(io::Error::other("Max retries exceeded"));
                    }
                    warn!(
                        "Connection error at byte {}, retry {}/{}: {}",
                        self.position, retry_count, self.max_retry, e
                    );
                    self.response = None;
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(io::Error::other(e)),
            }
        }
    }
}

#[async_trait]
impl ByteSource for HttpStreamSource {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pending_pos == self.pending.len() {
            if self.finished || !self.next_chunk().await? {
                return Ok(0);
            }
        }

        let available = &self.pending[self.pending_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending_pos += n;
        self.position += n as u64;
        Ok(n)
    }
}
