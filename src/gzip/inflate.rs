//! Inflate capability used by the streaming driver.
//!
//! The driver only needs "feed compressed bytes, receive decompressed bytes,
//! tell me whether the stream is finished". [`InflateSession`] is that seam;
//! [`Flate2Session`] backs it with a raw DEFLATE [`flate2::Decompress`].

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Outcome of a single inflate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateStatus {
    /// Output was produced and more may follow
    Produced,
    /// The decoder needs input the session does not have
    NeedsMoreInput,
    /// End of the DEFLATE stream reached
    Finished,
}

/// Bytes moved by one inflate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateCycle {
    /// Compressed bytes consumed from `input`
    pub consumed: usize,
    /// Decompressed bytes written to the start of `output`
    pub written: usize,
    pub status: InflateStatus,
}

/// Decoder-reported failure (corrupt stream, bad block type, ...)
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InflateError {
    pub message: String,
}

/// A single decode session over one compressed stream.
///
/// `input` is always the entire remaining compressed input, so a session may
/// treat it as final.
pub trait InflateSession {
    fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<InflateCycle, InflateError>;
}

/// Raw DEFLATE session backed by `flate2`.
pub struct Flate2Session {
    inner: Decompress,
}

impl Flate2Session {
    pub fn new() -> Self {
        Self {
            // false: raw DEFLATE, the gzip framing is handled by the parser
            inner: Decompress::new(false),
        }
    }
}

impl Default for Flate2Session {
    fn default() -> Self {
        Self::new()
    }
}

impl InflateSession for Flate2Session {
    /// Inflate until `output` is full, the stream ends, or the decoder stalls.
    ///
    /// A single `decompress` call may return early with room left in the
    /// output (for example after draining its 32 KiB window), so calls are
    /// repeated until one of those three conditions holds.
    fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<InflateCycle, InflateError> {
        let mut consumed = 0;
        let mut written = 0;

        loop {
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();

            let status = self
                .inner
                .decompress(&input[consumed..], &mut output[written..], FlushDecompress::None)
                .map_err(|e| InflateError {
                    message: e.to_string(),
                })?;

            let step_in = (self.inner.total_in() - before_in) as usize;
            let step_out = (self.inner.total_out() - before_out) as usize;
            consumed += step_in;
            written += step_out;

            let status = if status == Status::StreamEnd {
                InflateStatus::Finished
            } else if written == output.len() {
                InflateStatus::Produced
            } else if step_in == 0 && step_out == 0 {
                // No progress: the input ran out before the final block
                InflateStatus::NeedsMoreInput
            } else {
                continue;
            };

            return Ok(InflateCycle {
                consumed,
                written,
                status,
            });
        }
    }
}
