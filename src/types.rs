//! Shared types: [`ByteOrder`], [`PadWidth`], [`FormatParameters`], and
//! [`PayloadPolicy`].

use std::fmt;

use crate::{GsiError, Result};

/// Byte order for multi-byte fields in a Fortran unformatted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Byte order of the machine running this code.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// The other byte order.
    pub const fn swapped(self) -> Self {
        match self {
            Self::Big => Self::Little,
            Self::Little => Self::Big,
        }
    }

    pub fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Big => i32::from_be_bytes(bytes),
            Self::Little => i32::from_le_bytes(bytes),
        }
    }

    pub fn read_i64(self, bytes: [u8; 8]) -> i64 {
        match self {
            Self::Big => i64::from_be_bytes(bytes),
            Self::Little => i64::from_le_bytes(bytes),
        }
    }

    pub fn read_f32(self, bytes: [u8; 4]) -> f32 {
        match self {
            Self::Big => f32::from_be_bytes(bytes),
            Self::Little => f32::from_le_bytes(bytes),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Big => write!(f, "big-endian"),
            Self::Little => write!(f, "little-endian"),
        }
    }
}

/// Width of the length pads that frame each Fortran record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadWidth {
    /// 4-byte pads (the gfortran/ifort default).
    Four,
    /// 8-byte pads (older compilers, or `-frecord-marker=8`).
    Eight,
}

impl PadWidth {
    /// Convert a byte count into a pad width.
    pub fn from_bytes(n: usize) -> Result<Self> {
        match n {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            _ => Err(GsiError::UnsupportedPadWidth(n)),
        }
    }

    /// Number of bytes in one pad.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// How a file's records are framed: pad width plus whether multi-byte
/// values must be byte-swapped relative to this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatParameters {
    pub pad_width: PadWidth,
    pub swap_endian: bool,
}

impl FormatParameters {
    pub const fn new(pad_width: PadWidth, swap_endian: bool) -> Self {
        Self {
            pad_width,
            swap_endian,
        }
    }

    /// 4-byte pads with the given swap flag, for callers that skip detection.
    pub const fn with_swap(swap_endian: bool) -> Self {
        Self::new(PadWidth::Four, swap_endian)
    }

    /// Build parameters from an absolute byte order instead of a swap flag.
    pub fn from_byte_order(pad_width: PadWidth, order: ByteOrder) -> Self {
        Self::new(pad_width, order != ByteOrder::native())
    }

    /// Absolute byte order of the file's multi-byte values.
    pub fn byte_order(&self) -> ByteOrder {
        if self.swap_endian {
            ByteOrder::native().swapped()
        } else {
            ByteOrder::native()
        }
    }
}

impl Default for FormatParameters {
    /// 4-byte pads, native byte order.
    fn default() -> Self {
        Self::with_swap(false)
    }
}

impl fmt::Display for FormatParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-byte pads, {}",
            self.pad_width.bytes(),
            self.byte_order()
        )
    }
}

/// What a reader does when a payload's byte count differs from the size its
/// header or metadata implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadPolicy {
    /// Any mismatch is an error.
    Strict,
    /// Log a warning and decode whatever was read.
    Lenient,
}
