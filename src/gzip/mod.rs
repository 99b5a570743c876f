//! Gzip member parsing and streaming extraction.
//!
//! This module decompresses a gzip container held in memory straight into a
//! destination file, keeping at most one 64 KiB working buffer of decoded
//! data alive at any time.
//!
//! ## Architecture
//!
//! - [`structures`]: header, footer and member types plus format constants
//! - [`parser`]: locates the DEFLATE payload between header and footer
//! - [`inflate`]: the [`InflateSession`] decoder seam and its `flate2` backend
//! - [`sink`]: lazily created, append-only destination file
//! - [`driver`]: the bounded-buffer inflate loop with progress and cancellation
//! - [`extractor`]: high-level API that runs everything and checks the footer
//!
//! ## Gzip Format Overview
//!
//! A gzip member (RFC 1952) consists of:
//! 1. A 10-byte header (magic `1F 8B`, method, flags, mtime, xfl, os)
//! 2. Optional extra field, file name, comment and header CRC16
//! 3. Raw DEFLATE data
//! 4. An 8-byte footer: CRC32 and ISIZE (original size modulo 2^32)
//!
//! ## Limitations
//!
//! - Only the first member of a multi-member file is decoded
//! - The header CRC16 is skipped, not verified
//! - CRC32 of the output is verified only on request

pub mod driver;
pub mod extractor;
pub mod inflate;
pub mod parser;
pub mod sink;
pub mod structures;

pub use driver::{
    CancelHandler, DecodeHooks, DecodeSummary, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE, ProgressHandler,
    StreamingDecoder, working_buffer_size,
};
pub use extractor::{
    CancelFn, ExtractOptions, GunzipReport, GzipExtractor, ProgressFn, gunzip, gunzip_with,
};
pub use inflate::{Flate2Session, InflateCycle, InflateError, InflateSession, InflateStatus};
pub use parser::locate_payload;
pub use structures::*;
