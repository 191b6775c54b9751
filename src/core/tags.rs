//! Type and units capability masks
//!
//! Devices declare the payload kinds they accept as a bitmask (several
//! bits may be set) and the single kind they produce. The empty mask on
//! an output declaration is the reserved "unchanged" sentinel: the
//! device is transparent to propagation of that field.

use bitflags::bitflags;

bitflags! {
    /// Kind of data carried in the pipeline payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PayloadType: u8 {
        /// No data in the pipeline yet.
        const NONE = 1 << 0;
        /// Flat block of f64 values.
        const BLOCK = 1 << 1;
        /// Vector of f64 values.
        const VECTOR = 1 << 2;
        /// Row-major f64 matrix.
        const MATRIX = 1 << 3;
        /// Flat block of bytes.
        const BYTES = 1 << 4;
        /// Row-major byte matrix.
        const BYTE_MATRIX = 1 << 5;
        /// Compatible with any payload kind.
        const ANY = 0xFF;
    }
}

bitflags! {
    /// Physical units of the payload values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Units: u8 {
        /// No data in the pipeline yet.
        const NONE = 1 << 0;
        /// Radians.
        const RADIANS = 1 << 1;
        /// Dimensionless, scaled to [-1, +1].
        const MINMAX = 1 << 2;
        /// Compatible with any units.
        const ANY = 0xFF;
    }
}

impl PayloadType {
    /// Wire representation of a single concrete tag.
    pub fn tag_byte(self) -> u8 {
        self.bits()
    }

    pub fn from_tag_byte(byte: u8) -> Option<Self> {
        PayloadType::from_bits(byte)
    }
}

impl Units {
    pub fn tag_byte(self) -> u8 {
        self.bits()
    }

    pub fn from_tag_byte(byte: u8) -> Option<Self> {
        Units::from_bits(byte)
    }
}

impl std::fmt::Display for PayloadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.bits())
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.bits())
    }
}
