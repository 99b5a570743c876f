//! Gzip member parser.
//!
//! Locates the raw DEFLATE payload inside an in-memory gzip container.
//! The container is read from both ends:
//! 1. The fixed 10-byte header at the start identifies the member
//! 2. Optional header fields are skipped in RFC 1952 order
//!    (extra, file name, comment, header CRC16)
//! 3. The footer is always the last 8 bytes
//!
//! Everything between the end of the header and the footer is the payload.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use tracing::trace;

use crate::error::{GunzipError, Result};

use super::structures::*;

/// Locate the compressed payload and footer of a gzip container.
///
/// Pure function of `data`: nothing is allocated and nothing is written.
///
/// # Errors
///
/// - [`GunzipError::TooShort`] if `data` is shorter than 18 bytes
/// - [`GunzipError::BadMagicOrMethod`] on a wrong magic or a non-DEFLATE method
/// - [`GunzipError::PayloadOutOfRange`] if the header fields reach the footer
pub fn locate_payload(data: &[u8]) -> Result<GzipMember<'_>> {
    if data.len() < MIN_CONTAINER_SIZE {
        return Err(GunzipError::TooShort { len: data.len() });
    }

    let mut header = GzipHeader::from_bytes(data)?;
    let footer = GzipFooter::from_bytes(data)?;

    if !header.is_deflate_gzip() {
        return Err(GunzipError::BadMagicOrMethod {
            id1: header.id1,
            id2: header.id2,
            method: header.compression_method,
        });
    }

    let limit = data.len() - FOOTER_SIZE;
    let mut pos = HEADER_SIZE;

    if header.has_extra_field() {
        // XLEN sits at offset 10, always inside the 18-byte minimum
        let mut cursor = Cursor::new(&data[pos..]);
        let xlen = cursor.read_u16::<LittleEndian>()? as usize;
        pos += xlen + 2;
        trace!(xlen, "skipped extra field");
    }

    if header.has_filename() {
        let (name, next) = read_zero_terminated(data, pos, limit);
        header.filename = name;
        pos = next;
    }

    if header.has_comment() {
        let (comment, next) = read_zero_terminated(data, pos, limit);
        header.comment = comment;
        pos = next;
    }

    if header.has_header_crc16() {
        // The CRC16 value itself is not checked
        pos += 2;
    }

    if pos >= limit {
        return Err(GunzipError::PayloadOutOfRange { offset: pos, limit });
    }

    trace!(
        payload_offset = pos,
        payload_len = limit - pos,
        flags = header.flags,
        "located gzip payload"
    );

    Ok(GzipMember {
        header,
        payload_offset: pos,
        payload: &data[pos..limit],
        footer,
    })
}

/// Scan a null-terminated field starting at `pos` without crossing `limit`.
///
/// Returns the field bytes (if a terminator was found) and the position just
/// past the terminator. A missing terminator yields `limit + 1`, which the
/// caller rejects as out of range.
fn read_zero_terminated(data: &[u8], pos: usize, limit: usize) -> (Option<&[u8]>, usize) {
    if pos >= limit {
        return (None, pos.saturating_add(1));
    }

    match data[pos..limit].iter().position(|&b| b == 0) {
        Some(len) => (Some(&data[pos..pos + len]), pos + len + 1),
        None => (None, limit + 1),
    }
}
