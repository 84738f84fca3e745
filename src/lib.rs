//! Pure Rust reader for GSI diagnostic files.
//!
//! GSI writes its observation-minus-background diagnostics as Fortran
//! "unformatted sequential" files: each record is framed by a length pad
//! before and after the payload. The pad width (4 or 8 bytes) and byte order
//! are not recorded anywhere, so they are detected from the first record.
//! On top of the framing sit two record families: conventional observations
//! ([`ConvFile`]) and satellite radiances ([`RadFile`]).
//!
//! # Reading raw records
//!
//! ```
//! use std::io::Cursor;
//! use gsi_diag_rs::{ByteOrder, PadWidth, ReaderConfig, RecordStream};
//!
//! // One big-endian record with 8-byte pads.
//! let mut data = 3i64.to_be_bytes().to_vec();
//! data.extend_from_slice(b"abc");
//! data.extend_from_slice(&3i64.to_be_bytes());
//!
//! let mut stream = RecordStream::from_source(Cursor::new(data), &ReaderConfig::new()).unwrap();
//! assert_eq!(stream.format().pad_width, PadWidth::Eight);
//! assert_eq!(stream.byte_order(), ByteOrder::Big);
//! assert_eq!(stream.next_record().unwrap().unwrap().as_bytes(), b"abc");
//! assert!(stream.next_record().unwrap().is_none());
//! ```
//!
//! # Reading a conventional file
//!
//! ```
//! use std::io::Cursor;
//! use gsi_diag_rs::{ConvFile, ReaderConfig};
//!
//! fn record(out: &mut Vec<u8>, payload: &[u8]) {
//!     let pad = (payload.len() as i32).to_le_bytes();
//!     out.extend_from_slice(&pad);
//!     out.extend_from_slice(payload);
//!     out.extend_from_slice(&pad);
//! }
//!
//! let mut data = Vec::new();
//! record(&mut data, &2024031518i32.to_le_bytes());
//!
//! // header: variable, nchar, nreal, ii, mtype
//! let mut header = b"t  ".to_vec();
//! for v in [8i32, 18, 1, 120] {
//!     header.extend_from_slice(&v.to_le_bytes());
//! }
//! record(&mut data, &header);
//!
//! // payload: one station id, then 18 fields for that station
//! let mut payload = b"KDCA    ".to_vec();
//! for f in 1..=18 {
//!     let v = match f {
//!         17 => 281.5f32, // observation
//!         18 => 1.5,      // observation minus background
//!         _ => 0.0,
//!     };
//!     payload.extend_from_slice(&v.to_le_bytes());
//! }
//! record(&mut data, &payload);
//!
//! let mut file = ConvFile::from_source(Cursor::new(data), &ReaderConfig::new()).unwrap();
//! assert_eq!(file.n_rec(), 1);
//!
//! let batch = file.next_batch().unwrap().unwrap();
//! let row = batch.station(0).unwrap();
//! assert_eq!(row.sid, "KDCA");
//! assert_eq!(row.obs, 281.5);
//! assert_eq!(row.guess, 280.0);
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
pub mod conv;
pub mod detect;
pub mod error;
pub mod layout;
pub mod offsets;
pub mod rad;
pub mod record;
pub mod stream;
pub mod time;
pub mod types;

#[cfg(test)]
mod test_support;

pub use buffer::ByteBuffer;
pub use config::ReaderConfig;
pub use conv::{ConvFile, ConvHeader, ConvRecord};
pub use error::{GsiError, Result};
pub use layout::fortran_index;
pub use rad::{ChannelParams, RadFile, RadParams, RadRecord};
pub use record::{BAD_DATA, BAD_DATA_INT, ConvData, RadData};
pub use stream::{RawRecord, RecordStream};
pub use time::AnalysisDate;
pub use types::{ByteOrder, FormatParameters, PadWidth, PayloadPolicy};

pub use codec::{decode_length, peek_record_size, read_record};
pub use detect::detect;
