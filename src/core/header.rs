//! Frame header - fixed-layout record prefixing pipeline state and saved data
//!
//! The same 40-byte layout is used for the in-memory state header and for
//! every record a sink persists or transmits, so a reader on the other end
//! can verify magic and endianness before trusting the body.

use crate::core::tags::{PayloadType, Units};
use bitflags::bitflags;
use thiserror::Error;

/// Little-endian representation of "LOOP".
pub const MAGIC: u32 = 0x504F4F4C;

/// Schema version of the header layout.
pub const VERSION: u8 = 1;

bitflags! {
    /// Loop status flags shared through the header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        /// Some device has decided the loop is finished.
        const DONE = 1 << 0;
    }
}

/// Logical dimensions of the payload (rows, columns).
///
/// Commands to a deformable mirror are usually seen as vectors but still
/// have logical y,x dimensions, which sinks downstream may care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogDim {
    pub y: u64,
    pub x: u64,
}

/// Physical spacing between successive logical rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pitch {
    pub y: f64,
    pub x: f64,
}

/// Fixed-layout header: magic, version, status, payload tags, geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameHeader {
    pub magic: u32,
    pub version: u8,
    pub status: Status,
    pub type_tag: PayloadType,
    pub units: Units,
    pub log_dim: LogDim,
    pub pitch: Pitch,
}

/// Encoded size: 4 + 1 + 1 + 1 + 1 + 8 + 8 + 8 + 8.
pub const ENCODED_LEN: usize = 40;

#[derive(Debug, Error, PartialEq)]
pub enum HeaderError {
    #[error("header too short: {0} of {ENCODED_LEN} bytes")]
    TooShort(usize),

    #[error("bad magic 0x{0:08X}")]
    BadMagic(u32),

    #[error("unsupported header version {0}")]
    BadVersion(u8),
}

impl FrameHeader {
    /// Header for a freshly constructed pipeline: no data yet.
    pub fn new() -> Self {
        FrameHeader {
            magic: MAGIC,
            version: VERSION,
            status: Status::empty(),
            type_tag: PayloadType::NONE,
            units: Units::NONE,
            log_dim: LogDim::default(),
            pitch: Pitch::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.contains(Status::DONE)
    }

    pub fn set_done(&mut self) {
        self.status.insert(Status::DONE);
    }

    /// Encode to the fixed little-endian wire layout.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut buf = [0u8; ENCODED_LEN];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4] = self.version;
        buf[5] = self.status.bits();
        buf[6] = self.type_tag.tag_byte();
        buf[7] = self.units.tag_byte();
        buf[8..16].copy_from_slice(&self.log_dim.y.to_le_bytes());
        buf[16..24].copy_from_slice(&self.log_dim.x.to_le_bytes());
        buf[24..32].copy_from_slice(&self.pitch.y.to_le_bytes());
        buf[32..40].copy_from_slice(&self.pitch.x.to_le_bytes());
        buf
    }

    /// Decode from the wire layout, verifying magic and version.
    pub fn decode(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < ENCODED_LEN {
            return Err(HeaderError::TooShort(buf.len()));
        }
        let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(HeaderError::BadMagic(magic));
        }
        let version = buf[4];
        if version != VERSION {
            return Err(HeaderError::BadVersion(version));
        }
        Ok(FrameHeader {
            magic,
            version,
            status: Status::from_bits_truncate(buf[5]),
            type_tag: PayloadType::from_tag_byte(buf[6]).unwrap_or(PayloadType::NONE),
            units: Units::from_tag_byte(buf[7]).unwrap_or(Units::NONE),
            log_dim: LogDim {
                y: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
                x: u64::from_le_bytes(buf[16..24].try_into().unwrap()),
            },
            pitch: Pitch {
                y: f64::from_le_bytes(buf[24..32].try_into().unwrap()),
                x: f64::from_le_bytes(buf[32..40].try_into().unwrap()),
            },
        })
    }
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self::new()
    }
}
