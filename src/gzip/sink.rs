use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lifecycle of the destination file.
#[derive(Debug)]
enum Destination {
    /// Nothing written yet, the file has not been touched
    Pending,
    /// Opened for append
    Open(File),
}

/// Append-only output for decoded bytes.
///
/// The file is created the first time [`append`](Self::append) is called,
/// even with an empty slice. Bytes are appended to any existing content. A
/// running CRC32 of everything written is kept for the caller.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    destination: Destination,
    hasher: crc32fast::Hasher,
    written: u64,
}

impl OutputSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            destination: Destination::Pending,
            hasher: crc32fast::Hasher::new(),
            written: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.destination, Destination::Open(_))
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Append `bytes`, opening the destination on first use.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Destination::Pending = self.destination {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            debug!(path = %self.path.display(), "opened destination");
            self.destination = Destination::Open(file);
        }

        if let Destination::Open(file) = &mut self.destination {
            file.write_all(bytes)?;
        }
        self.hasher.update(bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Sync and close the destination.
    ///
    /// Writes go straight to the file, so the only errors left to surface
    /// are the ones the OS reports when committing data. `sync_all` returns
    /// those before the handle is dropped.
    ///
    /// Returns the number of bytes written and their CRC32.
    pub fn finish(self) -> io::Result<(u64, u32)> {
        if let Destination::Open(file) = self.destination {
            file.sync_all()?;
            debug!(path = %self.path.display(), bytes = self.written, "closed destination");
        }
        Ok((self.written, self.hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let mut sink = OutputSink::new(&path);
        assert!(!sink.is_open());
        assert!(!path.exists());

        sink.append(b"").unwrap();
        assert!(sink.is_open());
        assert!(path.exists());

        sink.append(b"abc").unwrap();
        sink.append(b"def").unwrap();
        let (written, crc) = sink.finish().unwrap();

        assert_eq!(written, 6);
        assert_eq!(crc, crc32fast::hash(b"abcdef"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
    }

    #[test]
    fn dropping_an_unused_sink_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.bin");

        let sink = OutputSink::new(&path);
        let (written, _) = sink.finish().unwrap();
        assert_eq!(written, 0);
        assert!(!path.exists());
    }

    #[test]
    fn finish_commits_every_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("many.bin");
        let chunk = [0x5Au8; 4096];

        let mut sink = OutputSink::new(&path);
        for _ in 0..16 {
            sink.append(&chunk).unwrap();
        }
        let (written, _) = sink.finish().unwrap();

        assert_eq!(written, 16 * 4096);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
    }

    #[test]
    fn appends_to_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.bin");
        std::fs::write(&path, b"old").unwrap();

        let mut sink = OutputSink::new(&path);
        sink.append(b"new").unwrap();
        sink.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"oldnew");
    }
}
