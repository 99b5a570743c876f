use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{GunzipError, Result};

/// GZIP magic bytes (ID1, ID2).
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compression method 8: DEFLATE. The only method RFC 1952 defines.
pub const CM_DEFLATE: u8 = 0x08;

/// Fixed header size - 10 bytes
pub const HEADER_SIZE: usize = 10;

/// Footer size (CRC32 + ISIZE) - 8 bytes
pub const FOOTER_SIZE: usize = 8;

/// Smallest possible container: header plus footer
pub const MIN_CONTAINER_SIZE: usize = HEADER_SIZE + FOOTER_SIZE;

/// Header flag bits (FLG byte)
pub mod flags {
    pub const FTEXT: u8 = 0b0000_0001;
    pub const FHCRC: u8 = 0b0000_0010;
    pub const FEXTRA: u8 = 0b0000_0100;
    pub const FNAME: u8 = 0b0000_1000;
    pub const FCOMMENT: u8 = 0b0001_0000;
}

/// Fixed part of the gzip member header plus views of its optional fields.
///
/// ```text
/// +---+---+---+---+---+---+---+---+---+---+
/// |ID1|ID2|CM |FLG|     MTIME     |XFL|OS |
/// +---+---+---+---+---+---+---+---+---+---+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader<'a> {
    pub id1: u8,
    pub id2: u8,
    pub compression_method: u8,
    pub flags: u8,
    pub mtime: u32,
    pub extra_flags: u8,
    pub os: u8,
    /// Original file name bytes, without the terminating null
    pub filename: Option<&'a [u8]>,
    /// Comment bytes, without the terminating null
    pub comment: Option<&'a [u8]>,
}

impl<'a> GzipHeader<'a> {
    /// Read the fixed 10-byte header. Optional fields are filled in by the parser.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(GunzipError::TooShort { len: data.len() });
        }

        let mut cursor = Cursor::new(&data[4..8]);
        let mtime = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            id1: data[0],
            id2: data[1],
            compression_method: data[2],
            flags: data[3],
            mtime,
            extra_flags: data[8],
            os: data[9],
            filename: None,
            comment: None,
        })
    }

    pub fn is_deflate_gzip(&self) -> bool {
        [self.id1, self.id2] == GZIP_MAGIC && self.compression_method == CM_DEFLATE
    }

    pub fn is_text(&self) -> bool {
        self.flags & flags::FTEXT != 0
    }

    pub fn has_header_crc16(&self) -> bool {
        self.flags & flags::FHCRC != 0
    }

    pub fn has_extra_field(&self) -> bool {
        self.flags & flags::FEXTRA != 0
    }

    pub fn has_filename(&self) -> bool {
        self.flags & flags::FNAME != 0
    }

    pub fn has_comment(&self) -> bool {
        self.flags & flags::FCOMMENT != 0
    }

    /// Original file name, lossily decoded (RFC 1952 specifies ISO 8859-1)
    pub fn filename_lossy(&self) -> Option<String> {
        self.filename
            .map(|name| String::from_utf8_lossy(name).into_owned())
    }

    /// Name of the operating system the member was created on
    pub fn os_name(&self) -> &'static str {
        match self.os {
            0 => "FAT",
            1 => "Amiga",
            2 => "VMS",
            3 => "Unix",
            4 => "VM/CMS",
            5 => "Atari TOS",
            6 => "HPFS",
            7 => "Macintosh",
            8 => "Z-System",
            9 => "CP/M",
            10 => "TOPS-20",
            11 => "NTFS",
            12 => "QDOS",
            13 => "Acorn RISCOS",
            _ => "unknown",
        }
    }
}

/// Trailing 8 bytes of a gzip member
///
/// ```text
/// +---+---+---+---+---+---+---+---+
/// |     CRC32     |     ISIZE     |
/// +---+---+---+---+---+---+---+---+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipFooter {
    pub crc32: u32,
    /// Size of the original input modulo 2^32
    pub original_size: u32,
}

impl GzipFooter {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < FOOTER_SIZE {
            return Err(GunzipError::TooShort { len: data.len() });
        }

        let mut cursor = Cursor::new(&data[data.len() - FOOTER_SIZE..]);

        Ok(Self {
            crc32: cursor.read_u32::<LittleEndian>()?,
            original_size: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Compare ISIZE against a decoded length, modulo 2^32
    pub fn matches_size(&self, len: u64) -> bool {
        self.original_size == len as u32
    }
}

/// A located gzip member: header, compressed payload and footer
#[derive(Debug, Clone)]
pub struct GzipMember<'a> {
    pub header: GzipHeader<'a>,
    pub payload_offset: usize,
    pub payload: &'a [u8],
    pub footer: GzipFooter,
}

impl GzipMember<'_> {
    /// Total size of the container, header and footer included
    pub fn container_size(&self) -> usize {
        self.payload_offset + self.payload.len() + FOOTER_SIZE
    }

    /// Percentage of space saved relative to the declared original size
    pub fn ratio_percent(&self) -> i64 {
        let original = self.footer.original_size as i64;
        if original == 0 {
            return 0;
        }
        100 - (self.container_size() as i64 * 100 / original)
    }
}
