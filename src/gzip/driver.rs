//! Streaming decode driver.
//!
//! Inflates a compressed payload through one fixed-size working buffer and
//! appends every filled buffer to the destination file, so peak memory stays
//! at most [`MAX_BUFFER_SIZE`] regardless of how large the archive is.
//!
//! ## Cycle protocol
//!
//! Each cycle hands the whole remaining input and the whole buffer to the
//! [`InflateSession`]:
//! - `Produced`: the buffer must be full. The cancel check is consulted,
//!   then the buffer is flushed and progress reported.
//! - `Finished`: the partial buffer is flushed (creating the file even when it
//!   is empty), final progress reported and the file closed.
//! - `NeedsMoreInput` or an error: the run fails. Output flushed so far stays
//!   on disk.

use std::path::Path;
use tracing::{debug, trace};

use crate::error::{GunzipError, Result};

use super::inflate::{InflateSession, InflateStatus};
use super::sink::OutputSink;

/// Smallest working buffer, used for tiny payloads
pub const MIN_BUFFER_SIZE: usize = 64;

/// Largest working buffer; caps peak memory for any input size
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Progress notification with the fraction of compressed input consumed
pub type ProgressHandler<'a> = Box<dyn FnMut(f64) + 'a>;

/// Cancel check; returning `true` aborts at the next cycle boundary
pub type CancelHandler<'a> = Box<dyn Fn() -> bool + 'a>;

/// Optional caller hooks, invoked synchronously on the decoding thread
#[derive(Default)]
pub struct DecodeHooks<'a> {
    pub progress: Option<ProgressHandler<'a>>,
    pub should_cancel: Option<CancelHandler<'a>>,
}

/// What a successful run wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    pub bytes_written: u64,
    /// CRC32 of every byte written
    pub crc32: u32,
    pub cycles: u64,
}

/// Working buffer capacity for a payload of `payload_len` bytes
pub fn working_buffer_size(payload_len: usize) -> usize {
    payload_len.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE)
}

enum State {
    Producing,
    Flushing { filled: usize, finished: bool },
}

/// Drives an [`InflateSession`] over one payload into one destination file.
pub struct StreamingDecoder<'a, S: InflateSession> {
    session: S,
    hooks: DecodeHooks<'a>,
}

impl<'a, S: InflateSession> StreamingDecoder<'a, S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            hooks: DecodeHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: DecodeHooks<'a>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Decode `payload` and append the output to `destination`.
    ///
    /// The destination is opened for append on the first flush; it is closed
    /// on every exit path.
    ///
    /// # Errors
    ///
    /// - [`GunzipError::EmptyPayload`] before anything is allocated
    /// - [`GunzipError::DecoderProtocol`] if an OK cycle left the buffer short
    /// - [`GunzipError::Cancelled`] if the cancel check fired at an OK cycle
    /// - [`GunzipError::DecoderFailure`] on a decoder error or truncated stream
    /// - [`GunzipError::Io`] if writing the destination fails
    pub fn run(mut self, payload: &[u8], destination: &Path) -> Result<DecodeSummary> {
        if payload.is_empty() {
            return Err(GunzipError::EmptyPayload);
        }

        let capacity = working_buffer_size(payload.len());
        let mut buffer = vec![0u8; capacity];
        let mut sink = OutputSink::new(destination);
        let mut consumed = 0usize;
        let mut cycles = 0u64;
        let mut state = State::Producing;

        debug!(
            payload_len = payload.len(),
            buffer = capacity,
            destination = %destination.display(),
            "starting inflate"
        );

        loop {
            state = match state {
                State::Producing => {
                    let cycle = self
                        .session
                        .inflate(&payload[consumed..], &mut buffer)
                        .map_err(|e| GunzipError::decoder(e.message))?;
                    cycles += 1;
                    consumed += cycle.consumed.min(payload.len() - consumed);

                    trace!(
                        cycle = cycles,
                        consumed,
                        written = cycle.written,
                        status = ?cycle.status,
                        "inflate cycle"
                    );

                    if cycle.written > capacity {
                        return Err(GunzipError::DecoderProtocol {
                            written: cycle.written,
                            capacity,
                        });
                    }

                    match cycle.status {
                        InflateStatus::Produced => {
                            if cycle.written != capacity {
                                return Err(GunzipError::DecoderProtocol {
                                    written: cycle.written,
                                    capacity,
                                });
                            }
                            if self.cancel_requested() {
                                debug!(cycles, bytes = sink.bytes_written(), "inflate cancelled");
                                return Err(GunzipError::Cancelled);
                            }
                            State::Flushing {
                                filled: capacity,
                                finished: false,
                            }
                        }
                        InflateStatus::Finished => State::Flushing {
                            filled: cycle.written,
                            finished: true,
                        },
                        InflateStatus::NeedsMoreInput => {
                            return Err(GunzipError::decoder(
                                "compressed stream ended before the final block",
                            ));
                        }
                    }
                }
                State::Flushing { filled, finished } => {
                    sink.append(&buffer[..filled])?;
                    self.report_progress(consumed, payload.len());

                    if finished {
                        let (bytes_written, crc32) = sink.finish()?;
                        debug!(bytes_written, cycles, "inflate finished");
                        return Ok(DecodeSummary {
                            bytes_written,
                            crc32,
                            cycles,
                        });
                    }
                    State::Producing
                }
            };
        }
    }

    fn cancel_requested(&self) -> bool {
        self.hooks.should_cancel.as_ref().is_some_and(|check| check())
    }

    fn report_progress(&mut self, consumed: usize, total: usize) {
        if let Some(progress) = self.hooks.progress.as_mut() {
            progress((consumed as f64 / total as f64).min(1.0));
        }
    }
}
