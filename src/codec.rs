//! Fortran unformatted record framing.
//!
//! Every record on disk is `pad | payload | pad`, where both pads hold the
//! payload length in bytes as a signed 4- or 8-byte integer. These functions
//! are stateless; [`RecordStream`](crate::RecordStream) binds them to a
//! source and a detected [`FormatParameters`](crate::FormatParameters).

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::buffer::ByteBuffer;
use crate::types::{ByteOrder, PadWidth};
use crate::{GsiError, Result};

/// Largest supported pad, in bytes.
const MAX_PAD: usize = 8;

/// Decode a record length from the first `pad_width` bytes of `bytes`.
///
/// The pad is a signed integer in the file's byte order, widened to `i64`.
pub fn decode_length(bytes: &[u8], pad_width: PadWidth, swap_endian: bool) -> Result<i64> {
    let n = pad_width.bytes();
    if bytes.len() < n {
        return Err(GsiError::ShortPad {
            which: "leading",
            expected: n,
            actual: bytes.len(),
        });
    }
    let order = if swap_endian {
        ByteOrder::native().swapped()
    } else {
        ByteOrder::native()
    };
    let value = match pad_width {
        PadWidth::Four => i64::from(order.read_i32([bytes[0], bytes[1], bytes[2], bytes[3]])),
        PadWidth::Eight => order.read_i64([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
    };
    Ok(value)
}

/// Read one complete record into `buffer`.
///
/// Returns `Ok(None)` when the source is at a clean end-of-file (no bytes
/// left where a leading pad would start) and `Ok(Some(len))` otherwise. A
/// zero-length record is `Some(0)`.
///
/// The caller sizes `buffer` beforehand (usually from
/// [`peek_record_size`]); a leading pad larger than `buffer.capacity()` is a
/// [`GsiError::RecordTooLarge`].
pub fn read_record<R: Read + ?Sized>(
    source: &mut R,
    buffer: &mut ByteBuffer,
    pad_width: PadWidth,
    swap_endian: bool,
) -> Result<Option<u64>> {
    let mut scratch = [0u8; MAX_PAD];
    let pad = &mut scratch[..pad_width.bytes()];

    let got = fill(source, pad)?;
    if got == 0 {
        return Ok(None);
    }
    if got < pad.len() {
        return Err(GsiError::ShortPad {
            which: "leading",
            expected: pad.len(),
            actual: got,
        });
    }

    let leading = decode_length(pad, pad_width, swap_endian)?;
    if leading < 0 {
        return Err(GsiError::NegativeLength(leading));
    }
    let length = leading as u64;
    let limit = buffer.capacity() as u64;
    if length > limit {
        return Err(GsiError::RecordTooLarge { length, limit });
    }

    let n_read = buffer.read(source, length as usize)? as u64;
    if n_read != length {
        return Err(GsiError::ShortPayload {
            expected: length,
            actual: n_read,
        });
    }

    let got = fill(source, pad)?;
    if got < pad.len() {
        return Err(GsiError::ShortPad {
            which: "trailing",
            expected: pad.len(),
            actual: got,
        });
    }
    let trailing = decode_length(pad, pad_width, swap_endian)?;
    if trailing != leading {
        return Err(GsiError::PadMismatch { leading, trailing });
    }

    Ok(Some(length))
}

/// Decode the length of the next record without consuming it.
///
/// Reads the leading pad, then seeks back over it so the next
/// [`read_record`] sees the same pad. Returns `Ok(None)` at end-of-file.
pub fn peek_record_size<R: Read + Seek + ?Sized>(
    source: &mut R,
    pad_width: PadWidth,
    swap_endian: bool,
) -> Result<Option<u64>> {
    let mut scratch = [0u8; MAX_PAD];
    let pad = &mut scratch[..pad_width.bytes()];

    let got = fill(source, pad)?;
    if got == 0 {
        return Ok(None);
    }
    source.seek(SeekFrom::Current(-(got as i64)))?;
    if got < pad.len() {
        return Err(GsiError::ShortPad {
            which: "leading",
            expected: pad.len(),
            actual: got,
        });
    }

    let length = decode_length(pad, pad_width, swap_endian)?;
    if length < 0 {
        return Err(GsiError::NegativeLength(length));
    }
    Ok(Some(length as u64))
}

/// Read until `out` is full or the source is exhausted.
pub(crate) fn fill<R: Read + ?Sized>(source: &mut R, out: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < out.len() {
        match source.read(&mut out[filled..]) {
            Ok(0) => break,
            Ok(k) => filled += k,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
