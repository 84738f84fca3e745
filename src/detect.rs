//! Record pad width and byte order detection.
//!
//! Fortran unformatted files carry no magic number. The only way to tell a
//! 4-byte big-endian file from an 8-byte little-endian one is to try each
//! interpretation on the first record and keep the one whose leading and
//! trailing pads agree.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::codec::{decode_length, fill};
use crate::types::{FormatParameters, PadWidth};
use crate::{GsiError, Result};

/// Candidates in trial order. The first one that validates wins.
const CANDIDATES: [FormatParameters; 4] = [
    FormatParameters::new(PadWidth::Four, true),
    FormatParameters::new(PadWidth::Four, false),
    FormatParameters::new(PadWidth::Eight, true),
    FormatParameters::new(PadWidth::Eight, false),
];

/// Determine the framing of a file from its first record.
///
/// `file_size` is the total length of `source` in bytes. The source is left
/// positioned at offset 0 whether or not detection succeeds.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use gsi_diag_rs::{detect, PadWidth};
///
/// // One big-endian record holding "abc" with 8-byte pads.
/// let mut data = 3i64.to_be_bytes().to_vec();
/// data.extend_from_slice(b"abc");
/// data.extend_from_slice(&3i64.to_be_bytes());
///
/// let size = data.len() as u64;
/// let format = detect(&mut Cursor::new(data), size).unwrap();
/// assert_eq!(format.pad_width, PadWidth::Eight);
/// ```
pub fn detect<R: Read + Seek + ?Sized>(
    source: &mut R,
    file_size: u64,
) -> Result<FormatParameters> {
    for candidate in CANDIDATES {
        if first_record_fits(source, file_size, candidate)? {
            source.seek(SeekFrom::Start(0))?;
            debug!(
                pad_width = candidate.pad_width.bytes(),
                swap_endian = candidate.swap_endian,
                file_size,
                "Detected record format"
            );
            return Ok(candidate);
        }
    }
    source.seek(SeekFrom::Start(0))?;
    Err(GsiError::FormatUndetected)
}

fn first_record_fits<R: Read + Seek + ?Sized>(
    source: &mut R,
    file_size: u64,
    candidate: FormatParameters,
) -> Result<bool> {
    let width = candidate.pad_width.bytes();
    let mut scratch = [0u8; 8];
    let pad = &mut scratch[..width];

    source.seek(SeekFrom::Start(0))?;
    if fill(source, pad)? < width {
        return Ok(false);
    }
    let leading = decode_length(pad, candidate.pad_width, candidate.swap_endian)?;
    if leading < 0 {
        return Ok(false);
    }

    let needed = (leading as u64).checked_add(2 * width as u64);
    if needed.is_none_or(|n| n > file_size) {
        trace!(
            pad_width = width,
            swap_endian = candidate.swap_endian,
            leading,
            "Candidate rejected: record does not fit in file"
        );
        return Ok(false);
    }

    source.seek(SeekFrom::Current(leading))?;
    if fill(source, pad)? < width {
        return Ok(false);
    }
    let trailing = decode_length(pad, candidate.pad_width, candidate.swap_endian)?;

    trace!(
        pad_width = width,
        swap_endian = candidate.swap_endian,
        leading,
        trailing,
        "Candidate checked"
    );
    Ok(trailing == leading)
}
