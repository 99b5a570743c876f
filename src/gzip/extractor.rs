use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{GunzipError, Result};

use super::driver::{DecodeHooks, DecodeSummary, StreamingDecoder};
use super::inflate::Flate2Session;
use super::parser::locate_payload;
use super::structures::{GzipFooter, GzipMember};

/// Post-decode checks applied by [`GzipExtractor`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Compare the CRC32 of the decoded stream with the footer, in addition
    /// to the size check
    pub verify_crc32: bool,
}

/// Result of a successful extraction
#[derive(Debug, Clone, Copy)]
pub struct GunzipReport {
    pub summary: DecodeSummary,
    pub footer: GzipFooter,
    /// Length of the destination file after decoding
    pub file_size: u64,
}

/// Gzip extractor over an in-memory container
pub struct GzipExtractor<'a> {
    data: &'a [u8],
    options: ExtractOptions,
    hooks: DecodeHooks<'a>,
}

impl<'a> GzipExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            options: ExtractOptions::default(),
            hooks: DecodeHooks::default(),
        }
    }

    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn verify_crc32(mut self, verify: bool) -> Self {
        self.options.verify_crc32 = verify;
        self
    }

    pub fn on_progress(mut self, progress: impl FnMut(f64) + 'a) -> Self {
        self.hooks.progress = Some(Box::new(progress));
        self
    }

    pub fn cancel_when(mut self, should_cancel: impl Fn() -> bool + 'a) -> Self {
        self.hooks.should_cancel = Some(Box::new(should_cancel));
        self
    }

    /// Parse the container without decoding it
    pub fn inspect(&self) -> Result<GzipMember<'a>> {
        locate_payload(self.data)
    }

    /// Decode the container into `output_path`.
    ///
    /// Decoded bytes are appended to `output_path`; an existing file is not
    /// truncated and its content counts towards the size check. Parse errors
    /// are returned before the file is touched.
    pub fn extract_to_file(self, output_path: &Path) -> Result<GunzipReport> {
        let member = locate_payload(self.data)?;
        let footer = member.footer;

        let summary = StreamingDecoder::new(Flate2Session::new())
            .with_hooks(self.hooks)
            .run(member.payload, output_path)?;

        let file_size = fs::metadata(output_path)?.len();
        if !footer.matches_size(file_size) {
            warn!(
                expected = footer.original_size,
                actual = file_size,
                "decoded size does not match footer"
            );
            return Err(GunzipError::SizeMismatch {
                expected: footer.original_size,
                actual: file_size,
            });
        }

        if self.options.verify_crc32 && summary.crc32 != footer.crc32 {
            warn!(
                expected = footer.crc32,
                computed = summary.crc32,
                "decoded CRC32 does not match footer"
            );
            return Err(GunzipError::ChecksumMismatch {
                expected: footer.crc32,
                computed: summary.crc32,
            });
        }

        debug!(file_size, cycles = summary.cycles, "extraction verified");

        Ok(GunzipReport {
            summary,
            footer,
            file_size,
        })
    }
}

/// Decode `data` into `output_path`, reporting only success or failure.
pub fn gunzip(data: &[u8], output_path: &Path) -> bool {
    GzipExtractor::new(data).extract_to_file(output_path).is_ok()
}

pub type ProgressFn<'a> = &'a mut dyn FnMut(f64);
pub type CancelFn<'a> = &'a dyn Fn() -> bool;

/// [`gunzip`] with optional progress and cancellation hooks.
pub fn gunzip_with<'a>(
    data: &'a [u8],
    output_path: &Path,
    progress: Option<ProgressFn<'a>>,
    should_cancel: Option<CancelFn<'a>>,
) -> bool {
    let mut extractor = GzipExtractor::new(data);
    if let Some(progress) = progress {
        extractor = extractor.on_progress(progress);
    }
    if let Some(should_cancel) = should_cancel {
        extractor = extractor.cancel_when(should_cancel);
    }
    match extractor.extract_to_file(output_path) {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "gunzip failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn abc_scenario() {
        let data = gzip(b"abc");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");

        let report = GzipExtractor::new(&data).extract_to_file(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        assert_eq!(report.footer.original_size, 3);
        assert_eq!(report.file_size, 3);
        assert!(gunzip(&data, &dir.path().join("abc2")));
    }

    #[test]
    fn footer_size_off_by_one_fails() {
        let mut data = gzip(b"hello world");
        let size_at = data.len() - 4;
        data[size_at] += 1;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");

        let err = GzipExtractor::new(&data).extract_to_file(&path).unwrap_err();

        assert!(matches!(
            err,
            GunzipError::SizeMismatch {
                expected: 12,
                actual: 11
            }
        ));
        // The mechanical decode itself succeeded
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn crc_mismatch_only_detected_when_enabled() {
        let mut data = gzip(b"checksummed");
        let crc_at = data.len() - 8;
        data[crc_at] ^= 0xFF;
        let dir = tempfile::tempdir().unwrap();

        assert!(
            GzipExtractor::new(&data)
                .extract_to_file(&dir.path().join("lenient"))
                .is_ok()
        );

        let err = GzipExtractor::new(&data)
            .verify_crc32(true)
            .extract_to_file(&dir.path().join("strict"))
            .unwrap_err();
        assert!(matches!(err, GunzipError::ChecksumMismatch { .. }));
    }

    #[test]
    fn parse_errors_leave_no_file() {
        let mut data = gzip(b"abc");
        data[0] = 0x00;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");

        assert!(!gunzip(&data, &path));
        assert!(!path.exists());
    }

    #[test]
    fn boolean_hooks_are_forwarded() {
        let data = gzip(&vec![7u8; 200_000]);
        let dir = tempfile::tempdir().unwrap();
        let mut last = 0.0;
        let mut progress = |p: f64| last = p;

        assert!(gunzip_with(
            &data,
            &dir.path().join("out"),
            Some(&mut progress),
            Some(&|| false)
        ));
        assert_eq!(last, 1.0);

        assert!(!gunzip_with(
            &data,
            &dir.path().join("cancelled"),
            None,
            Some(&|| true)
        ));
    }
}
