//! Error types for Fortran record framing and GSI diagnostic decoding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GsiError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported record pad width: {0} bytes (expected 4 or 8)")]
    UnsupportedPadWidth(usize),

    #[error("failed to read {which} record pad: expected {expected} bytes, got {actual}")]
    ShortPad {
        which: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("negative record length {0} in leading pad")]
    NegativeLength(i64),

    #[error("record length {length} exceeds limit of {limit} bytes")]
    RecordTooLarge { length: u64, limit: u64 },

    #[error("failed to read record payload: expected {expected} bytes, got {actual}")]
    ShortPayload { expected: u64, actual: u64 },

    #[error("record pad mismatch: leading pad says {leading}, trailing pad says {trailing}")]
    PadMismatch { leading: i64, trailing: i64 },

    #[error("could not determine record pad width and byte order")]
    FormatUndetected,

    #[error("unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("bad {what} record length: expected {expected}, got {actual} bytes")]
    BadRecordLength {
        what: &'static str,
        expected: String,
        actual: u64,
    },

    #[error("field {field} not present in {layout} record of {actual} bytes")]
    MissingField {
        layout: &'static str,
        field: &'static str,
        actual: usize,
    },

    #[error("{what} index {index} out of range (0..{len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("no extra block in this radiance record")]
    NoExtraBlock,

    #[error("{what} dimensions overflow the address space")]
    DimensionOverflow { what: &'static str },

    #[error("negative {what} dimension: {value}")]
    NegativeDimension { what: &'static str, value: i32 },
}

pub type Result<T> = std::result::Result<T, GsiError>;
