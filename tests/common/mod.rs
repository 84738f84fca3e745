//! Helpers for writing framed diagnostic files.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy)]
pub struct Framing {
    pub pad: usize,
    pub big_endian: bool,
}

impl Framing {
    pub const BE4: Framing = Framing {
        pad: 4,
        big_endian: true,
    };
    pub const LE4: Framing = Framing {
        pad: 4,
        big_endian: false,
    };
    pub const BE8: Framing = Framing {
        pad: 8,
        big_endian: true,
    };
    pub const LE8: Framing = Framing {
        pad: 8,
        big_endian: false,
    };

    pub fn pad(&self, len: usize) -> Vec<u8> {
        match (self.pad, self.big_endian) {
            (4, true) => (len as i32).to_be_bytes().to_vec(),
            (4, false) => (len as i32).to_le_bytes().to_vec(),
            (_, true) => (len as i64).to_be_bytes().to_vec(),
            (_, false) => (len as i64).to_le_bytes().to_vec(),
        }
    }

    pub fn i32(&self, v: i32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    pub fn f32(&self, v: f32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }
}

/// Accumulates framed records.
pub struct FileBuilder {
    pub framing: Framing,
    pub bytes: Vec<u8>,
}

impl FileBuilder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            bytes: Vec::new(),
        }
    }

    pub fn record(&mut self, payload: &[u8]) -> &mut Self {
        let pad = self.framing.pad(payload.len());
        self.bytes.extend_from_slice(&pad);
        self.bytes.extend_from_slice(payload);
        self.bytes.extend_from_slice(&pad);
        self
    }

    pub fn fields(&self) -> Fields {
        Fields {
            framing: self.framing,
            bytes: Vec::new(),
        }
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.bytes).unwrap();
        file.flush().unwrap();
        file
    }
}

/// Builds one record payload field by field.
pub struct Fields {
    framing: Framing,
    pub bytes: Vec<u8>,
}

impl Fields {
    pub fn text(mut self, s: &str, width: usize) -> Self {
        let mut field = vec![b' '; width];
        field[..s.len()].copy_from_slice(s.as_bytes());
        self.bytes.extend_from_slice(&field);
        self
    }

    pub fn int(mut self, v: i32) -> Self {
        self.bytes.extend_from_slice(&self.framing.i32(v));
        self
    }

    pub fn float(mut self, v: f32) -> Self {
        self.bytes.extend_from_slice(&self.framing.f32(v));
        self
    }

    pub fn floats(self, vs: &[f32]) -> Self {
        vs.iter().fold(self, |f, &v| f.float(v))
    }
}
