//! Builders for framed records used by the unit tests.

use crate::types::{ByteOrder, FormatParameters, PadWidth};

/// Frame `payload` as one Fortran record.
pub(crate) fn frame(payload: &[u8], format: FormatParameters) -> Vec<u8> {
    let pad = pad_bytes(payload.len() as i64, format);
    let mut out = Vec::with_capacity(payload.len() + 2 * pad.len());
    out.extend_from_slice(&pad);
    out.extend_from_slice(payload);
    out.extend_from_slice(&pad);
    out
}

pub(crate) fn pad_bytes(length: i64, format: FormatParameters) -> Vec<u8> {
    match (format.pad_width, format.byte_order()) {
        (PadWidth::Four, ByteOrder::Big) => (length as i32).to_be_bytes().to_vec(),
        (PadWidth::Four, ByteOrder::Little) => (length as i32).to_le_bytes().to_vec(),
        (PadWidth::Eight, ByteOrder::Big) => length.to_be_bytes().to_vec(),
        (PadWidth::Eight, ByteOrder::Little) => length.to_le_bytes().to_vec(),
    }
}

/// Appends fixed-layout fields in the file's byte order.
pub(crate) struct PayloadBuilder {
    order: ByteOrder,
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    pub(crate) fn new(format: FormatParameters) -> Self {
        Self {
            order: format.byte_order(),
            bytes: Vec::new(),
        }
    }

    pub(crate) fn text(mut self, s: &str, width: usize) -> Self {
        let mut field = vec![b' '; width];
        let n = s.len().min(width);
        field[..n].copy_from_slice(&s.as_bytes()[..n]);
        self.bytes.extend_from_slice(&field);
        self
    }

    pub(crate) fn int(mut self, v: i32) -> Self {
        match self.order {
            ByteOrder::Big => self.bytes.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::Little => self.bytes.extend_from_slice(&v.to_le_bytes()),
        }
        self
    }

    pub(crate) fn float(mut self, v: f32) -> Self {
        match self.order {
            ByteOrder::Big => self.bytes.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::Little => self.bytes.extend_from_slice(&v.to_le_bytes()),
        }
        self
    }

    pub(crate) fn floats(self, vs: &[f32]) -> Self {
        vs.iter().fold(self, |b, &v| b.float(v))
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.bytes
    }
}
