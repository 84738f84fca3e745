//! Growable staging buffer for record payloads.
//!
//! A [`ByteBuffer`] is owned by one [`RecordStream`](crate::RecordStream).
//! Its capacity only ever grows, so a file full of same-sized records
//! allocates once.

use std::io::{self, ErrorKind, Read};

/// Owned byte array with a separately tracked logical length.
///
/// `capacity()` is the number of bytes allocated; `len()` is the number of
/// bytes populated by the most recent [`read`](Self::read).
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    len: usize,
}

impl ByteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with `n` zeroed bytes already allocated.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            data: vec![0; n],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes populated by the most recent read.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Guarantee `capacity() >= n`.
    ///
    /// When growing, the new array is exactly `n` bytes, zero-filled, with the
    /// old contents copied to the front.
    pub fn extend(&mut self, n: usize) {
        if n <= self.data.len() {
            return;
        }
        let mut grown = vec![0u8; n];
        grown[..self.data.len()].copy_from_slice(&self.data);
        self.data = grown;
    }

    /// Extend to `n`, then read up to `n` bytes from `source`.
    ///
    /// Returns the number of bytes read, which is also the new logical
    /// length. A short count means the source hit end-of-input; `0` means it
    /// was already there. I/O errors are returned as-is so the caller decides
    /// whether they are fatal.
    pub fn read<R: Read + ?Sized>(&mut self, source: &mut R, n: usize) -> io::Result<usize> {
        self.extend(n);
        let mut filled = 0;
        while filled < n {
            match source.read(&mut self.data[filled..n]) {
                Ok(0) => break,
                Ok(k) => filled += k,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.len = filled;
                    return Err(e);
                }
            }
        }
        self.len = filled;
        Ok(filled)
    }
}
