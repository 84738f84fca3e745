//! Declarative binary layouts and Fortran array addressing.
//!
//! Fixed-shape records (the conventional header, the radiance metadata and
//! channel records) are described as a [`Layout`]: a table of named fields
//! with byte offsets and primitive types. [`Layout::unpack`] decodes any of
//! them in one pass.

use crate::types::ByteOrder;
use crate::{GsiError, Result};

/// Primitive type of a field in a fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed-width blank- or NUL-padded characters.
    Text(usize),
    Int32,
    Float32,
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            Self::Text(n) => n,
            Self::Int32 | Self::Float32 => 4,
        }
    }
}

/// One named field: where it sits and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, kind: FieldKind) -> Self {
        Self { name, offset, kind }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.kind.width()
    }
}

/// A named table of fields describing one record shape.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i32),
    Float(f32),
}

impl Layout {
    /// Byte length covering every field.
    pub fn size(&self) -> usize {
        self.fields.iter().map(FieldSpec::end).max().unwrap_or(0)
    }

    /// Decode every field that lies entirely within `bytes`.
    ///
    /// Fields past the end of `bytes` are left out; asking for them later
    /// yields [`GsiError::MissingField`].
    pub fn unpack(&self, bytes: &[u8], order: ByteOrder) -> Unpacked {
        let values = self
            .fields
            .iter()
            .filter(|f| f.end() <= bytes.len())
            .map(|f| {
                let raw = &bytes[f.offset..f.end()];
                let value = match f.kind {
                    FieldKind::Text(_) => FieldValue::Text(fixed_text(raw)),
                    FieldKind::Int32 => FieldValue::Int(order.read_i32(word(raw))),
                    FieldKind::Float32 => FieldValue::Float(order.read_f32(word(raw))),
                };
                (f.name, value)
            })
            .collect();
        Unpacked {
            layout: self.name,
            len: bytes.len(),
            values,
        }
    }
}

/// Field values decoded by [`Layout::unpack`], looked up by name.
#[derive(Debug, Clone)]
pub struct Unpacked {
    layout: &'static str,
    len: usize,
    values: Vec<(&'static str, FieldValue)>,
}

impl Unpacked {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn int(&self, name: &'static str) -> Result<i32> {
        match self.get(name) {
            Some(FieldValue::Int(v)) => Ok(*v),
            _ => Err(self.missing(name)),
        }
    }

    /// Like [`int`](Self::int), for trailing fields that older files omit.
    pub fn int_or(&self, name: &'static str, default: i32) -> i32 {
        self.int(name).unwrap_or(default)
    }

    pub fn float(&self, name: &'static str) -> Result<f32> {
        match self.get(name) {
            Some(FieldValue::Float(v)) => Ok(*v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn text(&self, name: &'static str) -> Result<&str> {
        match self.get(name) {
            Some(FieldValue::Text(s)) => Ok(s),
            _ => Err(self.missing(name)),
        }
    }

    fn missing(&self, field: &'static str) -> GsiError {
        GsiError::MissingField {
            layout: self.layout,
            field,
            actual: self.len,
        }
    }
}

/// Zero-based offset of element `(field, entity)` in a Fortran array whose
/// first dimension is `row_count`. The first index varies fastest.
/// Saturates, so an unaddressable element misses every lookup.
pub const fn fortran_index(row_count: usize, field: usize, entity: usize) -> usize {
    entity.saturating_mul(row_count).saturating_add(field)
}

/// Decode consecutive 4-byte floats. A trailing partial word is ignored.
pub fn decode_f32s(bytes: &[u8], order: ByteOrder) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| order.read_f32([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Fortran character data: drop trailing blanks and NULs.
pub(crate) fn fixed_text(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn word(raw: &[u8]) -> [u8; 4] {
    [raw[0], raw[1], raw[2], raw[3]]
}
