mod http;
mod local;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::debug;

/// Size of each ranged read when loading a whole source
pub const LOAD_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Largest read [`read_fully`] should issue at once
    fn preferred_chunk_size(&self) -> usize {
        LOAD_CHUNK_SIZE
    }
}

/// Load an entire source into memory using bounded ranged reads.
///
/// Each request covers at most [`ReadAt::preferred_chunk_size`] bytes, so
/// HTTP sources are fetched as a series of Range requests rather than one
/// huge response.
pub async fn read_fully<R: ReadAt + ?Sized>(reader: &R) -> Result<Vec<u8>> {
    let size = reader.size();
    let Ok(len) = usize::try_from(size) else {
        bail!("Source of {} bytes does not fit in memory", size);
    };

    let mut data = vec![0u8; len];
    let chunk = reader.preferred_chunk_size().max(1);
    let mut offset = 0usize;

    while offset < len {
        let end = offset.saturating_add(chunk).min(len);
        let n = reader.read_at(offset as u64, &mut data[offset..end]).await?;
        if n == 0 {
            bail!(
                "Unexpected end of source at {} of {} bytes",
                offset,
                len
            );
        }
        offset += n;
    }

    debug!(bytes = len, "loaded source");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemoryReader {
        data: Vec<u8>,
        max_read: usize,
    }

    #[async_trait]
    impl ReadAt for MemoryReader {
        async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let start = offset as usize;
            let n = buf.len().min(self.max_read).min(self.data.len() - start);
            buf[..n].copy_from_slice(&self.data[start..start + n]);
            Ok(n)
        }

        fn size(&self) -> u64 {
            self.data.len() as u64
        }
    }

    #[tokio::test]
    async fn loads_with_short_reads() {
        let reader = MemoryReader {
            data: (0..10_000u32).map(|i| i as u8).collect(),
            max_read: 333,
        };
        let loaded = read_fully(&reader).await.unwrap();
        assert_eq!(loaded, reader.data);
    }

    #[tokio::test]
    async fn reports_truncated_source() {
        struct Liar;

        #[async_trait]
        impl ReadAt for Liar {
            async fn read_at(&self, _offset: u64, _buf: &mut [u8]) -> Result<usize> {
                Ok(0)
            }

            fn size(&self) -> u64 {
                10
            }
        }

        assert!(read_fully(&Liar).await.is_err());
    }
}
