use super::ReadAt;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads issued against a local archive are limited only by this bound
const LOCAL_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Compressed archive on the local filesystem.
///
/// The size is captured when the file is opened. Reads past that size return
/// nothing, so a file that grows while it is loaded is still read as the
/// snapshot the gzip footer was located in.
pub struct LocalFileReader {
    path: PathBuf,
    file: File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
        let metadata = file
            .metadata()
            .with_context(|| format!("Cannot stat {}", path.display()))?;

        if !metadata.is_file() {
            bail!("{} is not a regular file", path.display());
        }

        debug!(path = %path.display(), size = metadata.len(), "opened local archive");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn positional_read(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn positional_read(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        // seek_read moves the file cursor; every caller passes an explicit offset
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }

    #[cfg(not(any(unix, windows)))]
    fn positional_read(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.read(buf)
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }

        let remaining = self.size - offset;
        let len = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        self.positional_read(offset, &mut buf[..len])
            .with_context(|| format!("Read of {} at offset {} failed", self.path.display(), offset))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn preferred_chunk_size(&self) -> usize {
        LOCAL_CHUNK_SIZE
    }
}
