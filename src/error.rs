//! Error types for gunzip operations.
//!
//! Every failure of the decode pipeline maps to one [`GunzipError`] variant.
//! None of them is retriable: a container that fails to parse or decode will
//! fail the same way again.

use std::io;
use thiserror::Error;

/// Result alias used throughout the gzip pipeline.
pub type Result<T> = std::result::Result<T, GunzipError>;

/// Errors produced while locating, decoding or validating a gzip member.
#[derive(Debug, Error)]
pub enum GunzipError {
    /// Input is smaller than the 10-byte header plus 8-byte footer.
    #[error("Input too short: {len} bytes, a gzip container needs at least 18")]
    TooShort { len: usize },

    /// Magic bytes or compression method do not identify a DEFLATE gzip member.
    #[error("Not a gzip DEFLATE stream: id1={id1:#04x} id2={id2:#04x} method={method}")]
    BadMagicOrMethod { id1: u8, id2: u8, method: u8 },

    /// Optional header fields run into (or past) the footer.
    #[error("No compressed payload: header ends at {offset}, footer starts at {limit}")]
    PayloadOutOfRange { offset: usize, limit: usize },

    /// The driver was handed an empty payload.
    #[error("Empty compressed payload")]
    EmptyPayload,

    /// Decoder reported OK without filling the working buffer.
    #[error("Decoder returned OK with {written} of {capacity} buffer bytes filled")]
    DecoderProtocol { written: usize, capacity: usize },

    /// Decoder reported an error or ran out of input before the stream ended.
    #[error("Decoder failure: {message}")]
    DecoderFailure { message: String },

    /// The cancel check asked to stop.
    #[error("Decompression cancelled")]
    Cancelled,

    /// Decoded length does not match ISIZE from the footer.
    #[error("Size mismatch: footer declares {expected} bytes, output has {actual}")]
    SizeMismatch { expected: u32, actual: u64 },

    /// Decoded CRC32 does not match the footer.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Failure creating, writing or inspecting the destination file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Fieldless discriminant of [`GunzipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TooShort,
    BadMagicOrMethod,
    PayloadOutOfRange,
    EmptyPayload,
    DecoderProtocol,
    DecoderFailure,
    Cancelled,
    SizeMismatch,
    ChecksumMismatch,
    Io,
}

impl GunzipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GunzipError::TooShort { .. } => ErrorKind::TooShort,
            GunzipError::BadMagicOrMethod { .. } => ErrorKind::BadMagicOrMethod,
            GunzipError::PayloadOutOfRange { .. } => ErrorKind::PayloadOutOfRange,
            GunzipError::EmptyPayload => ErrorKind::EmptyPayload,
            GunzipError::DecoderProtocol { .. } => ErrorKind::DecoderProtocol,
            GunzipError::DecoderFailure { .. } => ErrorKind::DecoderFailure,
            GunzipError::Cancelled => ErrorKind::Cancelled,
            GunzipError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            GunzipError::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            GunzipError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the error was raised before any output could be written.
    pub fn is_malformed_container(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TooShort | ErrorKind::BadMagicOrMethod | ErrorKind::PayloadOutOfRange
        )
    }

    pub(crate) fn decoder(message: impl Into<String>) -> Self {
        GunzipError::DecoderFailure {
            message: message.into(),
        }
    }
}
