use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{LOAD_CHUNK_SIZE, ReadAt};
use anyhow::{Result, anyhow, bail};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRY: u32 = 10;

/// HTTP reader for remote gzip files.
///
/// Uses Range requests when the server advertises them. Servers without
/// Range support are still readable, but only as one full-body request.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    supports_ranges: bool,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpRangeReader {
    /// Create a new HTTP reader
    ///
    /// This will send a HEAD request to get the file size and check for
    /// Range support
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let supports_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));

        let size: u64 = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        if supports_ranges {
            debug!(url = %url, size, "remote source supports range requests");
        } else {
            warn!(url = %url, size, "no Range support, fetching the archive in one request");
        }

        Ok(Self {
            client,
            url,
            size,
            supports_ranges,
            transferred_bytes: AtomicU64::new(0),
            max_retry: DEFAULT_MAX_RETRY,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Send a GET, retrying connection failures and timeouts with a linear backoff
    async fn get(&self, range: Option<&str>) -> Result<Response> {
        let mut retry_count = 0;

        loop {
            let mut request = self.client.get(&self.url);
            if let Some(range) = range {
                request = request.header("Range", range);
            }

            match request.send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    warn!(
                        retry = retry_count,
                        max_retry = self.max_retry,
                        error = %e,
                        "connection error, retrying request"
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Whole-body read for servers without Range support
    async fn read_whole(&self, buf: &mut [u8]) -> Result<usize> {
        if (buf.len() as u64) < self.size {
            bail!(
                "Server without Range support needs a {} byte read, got a {} byte buffer",
                self.size,
                buf.len()
            );
        }

        let resp = self.get(None).await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let bytes = resp.bytes().await?;
        if bytes.len() as u64 != self.size {
            bail!(
                "Server sent {} bytes, Content-Length announced {}",
                bytes.len(),
                self.size
            );
        }

        buf[..bytes.len()].copy_from_slice(&bytes);
        self.transferred_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        Ok(bytes.len())
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        if !self.supports_ranges {
            if offset != 0 {
                bail!("Remote server does not support Range requests");
            }
            return self.read_whole(buf).await;
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let expected_size = (end - offset + 1) as usize;
        let mut received = 0;

        while received < expected_size {
            let range = format!("bytes={}-{}", offset + received as u64, end);
            let resp = self.get(Some(&range)).await?;

            if resp.status() != StatusCode::PARTIAL_CONTENT {
                bail!("HTTP request failed with status: {}", resp.status());
            }

            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                bail!("Server returned an empty body for {}", range);
            }

            let chunk_len = bytes.len().min(expected_size - received);
            buf[received..received + chunk_len].copy_from_slice(&bytes[..chunk_len]);
            received += chunk_len;

            self.transferred_bytes
                .fetch_add(chunk_len as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn preferred_chunk_size(&self) -> usize {
        if self.supports_ranges {
            LOAD_CHUNK_SIZE
        } else {
            usize::MAX
        }
    }
}
