//! # rgunzip
//!
//! A Rust gunzip utility that streams large gzip archives to disk.
//!
//! The compressed container is held in memory, but the decompressed output
//! never is: a single working buffer of at most 64 KiB is inflated, appended
//! to the destination file and reused, so archives that expand to many
//! gigabytes can be decoded with a small, fixed memory footprint.
//!
//! ## Features
//!
//! - Streaming DEFLATE decode through a bounded buffer
//! - Full RFC 1952 header handling (extra field, file name, comment, header CRC16)
//! - Size check against the footer, with optional CRC32 verification
//! - Progress reporting and cooperative cancellation
//! - Reading archives from the local filesystem or HTTP URLs using Range requests
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use rgunzip::GzipExtractor;
//!
//! fn main() -> anyhow::Result<()> {
//!     let data = std::fs::read("dump.sql.gz")?;
//!
//!     let report = GzipExtractor::new(&data)
//!         .verify_crc32(true)
//!         .on_progress(|fraction| eprintln!("{:.0}%", fraction * 100.0))
//!         .extract_to_file(Path::new("dump.sql"))?;
//!
//!     println!("wrote {} bytes", report.file_size);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod gzip;
pub mod io;

pub use cli::Cli;
pub use error::{ErrorKind, GunzipError};
pub use gzip::{ExtractOptions, GunzipReport, GzipExtractor, gunzip, gunzip_with};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, read_fully};
