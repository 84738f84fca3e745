//! Forward-only record access over a seekable byte source.
//!
//! A [`RecordStream`] owns its source and a [`ByteBuffer`], and yields one
//! [`RawRecord`] at a time. Each record borrows the buffer, so it must be
//! dropped (or copied out of) before the next read.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::buffer::ByteBuffer;
use crate::codec;
use crate::config::ReaderConfig;
use crate::detect::detect;
use crate::types::{ByteOrder, FormatParameters};
use crate::{GsiError, Result};

/// A record payload, without its pads, borrowed from the stream's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    data: &'a [u8],
}

impl<'a> RawRecord<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A byte source bound to one file's record framing.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use gsi_diag_rs::{ReaderConfig, RecordStream};
///
/// // Two little-endian records with 4-byte pads.
/// let mut data = Vec::new();
/// for payload in [&b"first"[..], &b"second"[..]] {
///     let pad = (payload.len() as i32).to_le_bytes();
///     data.extend_from_slice(&pad);
///     data.extend_from_slice(payload);
///     data.extend_from_slice(&pad);
/// }
///
/// let mut stream = RecordStream::from_source(Cursor::new(data), &ReaderConfig::new()).unwrap();
/// assert_eq!(stream.next_record().unwrap().unwrap().as_bytes(), b"first");
/// assert_eq!(stream.next_record().unwrap().unwrap().as_bytes(), b"second");
/// assert!(stream.next_record().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct RecordStream<R> {
    source: R,
    buffer: ByteBuffer,
    format: FormatParameters,
    max_record_len: u64,
    records_read: u64,
}

impl RecordStream<BufReader<File>> {
    /// Open a file, detecting its format unless `config` supplies one.
    pub fn open<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        debug!(path = %path.display(), file_size, "Opening record stream");
        Self::with_size(BufReader::new(file), file_size, config)
    }
}

impl<R: Read + Seek> RecordStream<R> {
    /// Wrap a source positioned at its first record, with known framing.
    pub fn new(source: R, format: FormatParameters) -> Self {
        Self {
            source,
            buffer: ByteBuffer::new(),
            format,
            max_record_len: ReaderConfig::new().max_record_len,
            records_read: 0,
        }
    }

    /// Wrap a source, detecting its format unless `config` supplies one.
    pub fn from_source(mut source: R, config: &ReaderConfig) -> Result<Self> {
        let file_size = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        Self::with_size(source, file_size, config)
    }

    fn with_size(mut source: R, file_size: u64, config: &ReaderConfig) -> Result<Self> {
        let format = match config.format {
            Some(format) => format,
            None => match detect(&mut source, file_size) {
                Ok(format) => format,
                Err(GsiError::FormatUndetected) => match config.fallback {
                    Some(fallback) => {
                        warn!(%fallback, "Record format not detected, using fallback");
                        fallback
                    }
                    None => return Err(GsiError::FormatUndetected),
                },
                Err(e) => return Err(e),
            },
        };
        let mut stream = Self::new(source, format);
        stream.max_record_len = config.max_record_len;
        Ok(stream)
    }

    pub fn format(&self) -> FormatParameters {
        self.format
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.format.byte_order()
    }

    /// Number of records returned by [`next_record`](Self::next_record) so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Length of the next record's payload, without consuming it.
    pub fn peek_record_size(&mut self) -> Result<Option<u64>> {
        codec::peek_record_size(
            &mut self.source,
            self.format.pad_width,
            self.format.swap_endian,
        )
    }

    /// Read the next record. `Ok(None)` at a clean end-of-file.
    pub fn next_record(&mut self) -> Result<Option<RawRecord<'_>>> {
        let Some(size) = self.peek_record_size()? else {
            return Ok(None);
        };
        if size > self.max_record_len {
            return Err(GsiError::RecordTooLarge {
                length: size,
                limit: self.max_record_len,
            });
        }
        self.buffer.extend(size as usize);

        let read = codec::read_record(
            &mut self.source,
            &mut self.buffer,
            self.format.pad_width,
            self.format.swap_endian,
        )?;
        let Some(length) = read else {
            return Ok(None);
        };
        self.records_read += 1;
        trace!(record = self.records_read, length, "Read record");

        Ok(Some(RawRecord {
            data: self.buffer.as_slice(),
        }))
    }

    /// Byte offset of the next record's leading pad.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.source.stream_position()?)
    }

    /// Reposition to a record boundary previously returned by
    /// [`position`](Self::position).
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.source.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }
}
