//! Conventional (surface, sounding, aircraft, ...) diagnostic files.
//!
//! File shape, one Fortran record per line:
//!
//! ```text
//! idate                                  4 bytes, YYYYMMDDHH
//! header  var nchar nreal ii mtype [ioff]  19 or 23 bytes
//! payload cdiag[ii] rdiag[nreal, ii]     8*ii + 4*nreal*ii bytes
//! header ...
//! payload ...
//! ```
//!
//! `rdiag` is a Fortran `(nreal, ii)` array, so every station's fields are
//! contiguous.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::config::ReaderConfig;
use crate::layout::{FieldKind, FieldSpec, Layout, decode_f32s, fixed_text, fortran_index};
use crate::offsets::conv::*;
use crate::record::{BAD_DATA, BAD_DATA_INT, ConvData, difference, is_bad_data, nint, rescale_lon};
use crate::stream::RecordStream;
use crate::time::AnalysisDate;
use crate::types::{ByteOrder, FormatParameters, PayloadPolicy};
use crate::{GsiError, Result};

/// Header length without the trailing `ioff` word.
pub const HEADER_LEN: usize = 19;

/// Header length with the trailing `ioff` word.
pub const HEADER_LEN_EXTENDED: usize = 23;

/// Bytes per station identifier.
pub const STATION_ID_LEN: usize = 8;

const HEADER: Layout = Layout {
    name: "conventional header",
    fields: &[
        FieldSpec::new("variable", 0, FieldKind::Text(3)),
        FieldSpec::new("nchar", 3, FieldKind::Int32),
        FieldSpec::new("nreal", 7, FieldKind::Int32),
        FieldSpec::new("ii", 11, FieldKind::Int32),
        FieldSpec::new("mtype", 15, FieldKind::Int32),
        FieldSpec::new("ioff", 19, FieldKind::Int32),
    ],
};

/// Decoded conventional header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvHeader {
    pub variable: String,
    pub nchar: i32,
    /// Fields per station.
    pub nreal: usize,
    /// Station count.
    pub ii: usize,
    pub mtype: i32,
    /// Present only in 23-byte headers.
    pub ioff: Option<i32>,
}

impl ConvHeader {
    pub fn parse(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        if bytes.len() != HEADER_LEN && bytes.len() != HEADER_LEN_EXTENDED {
            return Err(GsiError::BadRecordLength {
                what: "conventional header",
                expected: format!("{HEADER_LEN} or {HEADER_LEN_EXTENDED}"),
                actual: bytes.len() as u64,
            });
        }
        let fields = HEADER.unpack(bytes, order);
        let header = Self {
            variable: fields.text("variable")?.trim().to_string(),
            nchar: fields.int("nchar")?,
            nreal: dimension("nreal", fields.int("nreal")?)?,
            ii: dimension("ii", fields.int("ii")?)?,
            mtype: fields.int("mtype")?,
            ioff: fields.int("ioff").ok(),
        };
        if header.checked_payload_len().is_none() {
            return Err(GsiError::DimensionOverflow {
                what: "conventional payload",
            });
        }
        Ok(header)
    }

    /// Whether this batch carries both wind components.
    pub fn is_wind(&self) -> bool {
        self.variable == "uv"
    }

    /// Byte length the matching payload record must have.
    ///
    /// Saturates for dimensions [`parse`](Self::parse) would reject.
    pub fn payload_len(&self) -> usize {
        self.checked_payload_len().unwrap_or(usize::MAX)
    }

    fn checked_payload_len(&self) -> Option<usize> {
        let reals = self.nreal.checked_mul(4)?.checked_mul(self.ii)?;
        self.ii.checked_mul(STATION_ID_LEN)?.checked_add(reals)
    }

    /// Output rows this batch produces: one per station, two for winds.
    pub fn row_count(&self) -> usize {
        if self.is_wind() { self.ii.saturating_mul(2) } else { self.ii }
    }
}

fn dimension(what: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| GsiError::NegativeDimension { what, value })
}

/// One header/payload pair: `ii` stations of `nreal` fields each.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvRecord {
    pub header: ConvHeader,
    pub date: AnalysisDate,
    station_ids: Vec<String>,
    rdiag: Vec<f32>,
}

impl ConvRecord {
    /// Decode a payload record against its header.
    ///
    /// Under [`PayloadPolicy::Strict`] the payload must be exactly
    /// [`ConvHeader::payload_len`] bytes.
    pub fn decode(
        header: ConvHeader,
        payload: &[u8],
        date: AnalysisDate,
        order: ByteOrder,
        policy: PayloadPolicy,
    ) -> Result<Self> {
        let expected = header.payload_len();
        if payload.len() != expected {
            match policy {
                PayloadPolicy::Strict => {
                    return Err(GsiError::BadRecordLength {
                        what: "conventional payload",
                        expected: expected.to_string(),
                        actual: payload.len() as u64,
                    });
                }
                PayloadPolicy::Lenient => warn!(
                    variable = %header.variable,
                    expected,
                    actual = payload.len(),
                    "Conventional payload size mismatch"
                ),
            }
        }

        let cdiag_len = STATION_ID_LEN.saturating_mul(header.ii).min(payload.len());
        let station_ids = payload[..cdiag_len]
            .chunks_exact(STATION_ID_LEN)
            .map(fixed_text)
            .collect();
        let rdiag = decode_f32s(&payload[cdiag_len..], order);

        Ok(Self {
            header,
            date,
            station_ids,
            rdiag,
        })
    }

    pub fn variable(&self) -> &str {
        &self.header.variable
    }

    pub fn n_stations(&self) -> usize {
        self.header.ii
    }

    pub fn nreal(&self) -> usize {
        self.header.nreal
    }

    pub fn station_id(&self, station: usize) -> Result<&str> {
        self.check_station(station)?;
        self.station_ids
            .get(station)
            .map(String::as_str)
            .ok_or(GsiError::IndexOutOfRange {
                what: "station id",
                index: station,
                len: self.station_ids.len(),
            })
    }

    /// Zero-based `rdiag(field, station)`.
    pub fn rdiag(&self, field: usize, station: usize) -> Result<f64> {
        self.check_station(station)?;
        if field >= self.header.nreal {
            return Err(GsiError::IndexOutOfRange {
                what: "conventional field",
                index: field,
                len: self.header.nreal,
            });
        }
        let n = fortran_index(self.header.nreal, field, station);
        self.rdiag
            .get(n)
            .map(|&v| f64::from(v))
            .ok_or(GsiError::IndexOutOfRange {
                what: "conventional payload",
                index: n,
                len: self.rdiag.len(),
            })
    }

    /// Background value: observation minus (observation - background).
    pub fn guess(&self, station: usize) -> Result<f64> {
        Ok(self.rdiag(OBS_DATA - 1, station)? - self.rdiag(OMG - 1, station)?)
    }

    /// Background value of the second wind component.
    pub fn guess_v(&self, station: usize) -> Result<f64> {
        Ok(self.rdiag(OBS_V_DATA - 1, station)? - self.rdiag(OMG_V - 1, station)?)
    }

    /// Extract the row for one station.
    ///
    /// Fields beyond this file's `nreal` (older GSI versions write fewer)
    /// come back as [`BAD_DATA`].
    pub fn station(&self, station: usize) -> Result<ConvData> {
        self.check_station(station)?;
        let get = |index: usize| self.field_or_bad(index, station);

        let var = self.header.variable.clone();
        let obs = get(OBS_DATA);
        let (obs_v, guess_v) = if self.header.is_wind() {
            let obs_v = get(OBS_V_DATA);
            (Some(obs_v), Some(difference(obs_v, get(OMG_V))))
        } else {
            (None, None)
        };

        let hours = get(OBS_HOURS);
        let fcst_ut = self.date.unix_seconds();
        let obs_ut = if is_bad_data(hours) {
            fcst_ut
        } else {
            self.date.offset_seconds(hours)
        };

        let hgt = nint(get(HEIGHT));
        let setup_qc = nint(get(SETUP_QC));

        Ok(ConvData {
            prs: if var == "pw" { BAD_DATA } else { get(PRESSURE) },
            var,
            sid: self.station_ids.get(station).cloned().unwrap_or_default(),
            obtype: nint(get(OBSTYPE)),
            lat: get(LAT),
            lon: rescale_lon(get(LON)),
            elv: get(ELEVATION),
            hgt: if hgt < 0 { BAD_DATA_INT } else { hgt },
            fcst_ut,
            obs_ut,
            obs,
            guess: difference(obs, get(OMG)),
            obs_v,
            guess_v,
            obs_qc: nint(get(INPUT_QC)),
            err_in: get(PB_INVERSE),
            err_adj: get(READ_PB_INVERSE),
            err_fin: get(FINAL_INVERSE),
            prep_use: nint(get(USAGE)),
            anly_use: nint(get(ANALYSIS_USE)),
            setup_qc: if setup_qc == BAD_SETUP_QC {
                BAD_DATA_INT
            } else {
                setup_qc
            },
            qc_wght: get(QC_WEIGHT),
        })
    }

    /// Every output row in station order, with `uv` split into `u` then `v`.
    pub fn rows(&self) -> Result<Vec<ConvData>> {
        let mut out = Vec::new();
        for i in 0..self.header.ii {
            let row = self.station(i)?;
            match row.split_wind() {
                Some((u, v)) => {
                    out.push(u);
                    out.push(v);
                }
                None => out.push(row),
            }
        }
        Ok(out)
    }

    fn check_station(&self, station: usize) -> Result<()> {
        if station >= self.header.ii {
            return Err(GsiError::IndexOutOfRange {
                what: "station",
                index: station,
                len: self.header.ii,
            });
        }
        Ok(())
    }

    /// 1-based field lookup for row extraction.
    fn field_or_bad(&self, index: usize, station: usize) -> f64 {
        if index == 0 || index > self.header.nreal {
            return BAD_DATA;
        }
        self.rdiag
            .get(fortran_index(self.header.nreal, index - 1, station))
            .map_or(BAD_DATA, |&v| f64::from(v))
    }
}

/// Reader for a conventional diagnostic file.
///
/// Opening reads the analysis date and takes an inventory of the file, then
/// [`next_batch`](Self::next_batch) (or the [`Iterator`] impl) yields one
/// [`ConvRecord`] per header/payload pair.
#[derive(Debug)]
pub struct ConvFile<R> {
    stream: RecordStream<R>,
    date: AnalysisDate,
    policy: PayloadPolicy,
    n_rec: usize,
    n_pair: usize,
    done: bool,
}

impl ConvFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let stream = RecordStream::open(path, config)?;
        Self::from_stream(stream, config)
    }
}

impl<R: Read + Seek> ConvFile<R> {
    pub fn from_source(source: R, config: &ReaderConfig) -> Result<Self> {
        let stream = RecordStream::from_source(source, config)?;
        Self::from_stream(stream, config)
    }

    /// Take over a stream positioned at the date record.
    pub fn from_stream(mut stream: RecordStream<R>, config: &ReaderConfig) -> Result<Self> {
        let order = stream.byte_order();
        let date = {
            let rec = stream
                .next_record()?
                .ok_or(GsiError::UnexpectedEof("analysis date"))?;
            let bytes = rec.as_bytes();
            if bytes.len() != 4 {
                return Err(GsiError::BadRecordLength {
                    what: "analysis date",
                    expected: "4".into(),
                    actual: bytes.len() as u64,
                });
            }
            AnalysisDate::from_packed(order.read_i32([bytes[0], bytes[1], bytes[2], bytes[3]]))
        };

        let data_start = stream.position()?;
        let (n_rec, n_pair) = inventory(&mut stream)?;
        stream.seek_to(data_start)?;

        debug!(%date, n_rec, n_pair, format = %stream.format(), "Opened conventional file");

        Ok(Self {
            stream,
            date,
            policy: config.payload_policy.unwrap_or(PayloadPolicy::Strict),
            n_rec,
            n_pair,
            done: false,
        })
    }

    pub fn date(&self) -> AnalysisDate {
        self.date
    }

    pub fn format(&self) -> FormatParameters {
        self.stream.format()
    }

    /// Number of header/payload pairs in the file.
    pub fn n_rec(&self) -> usize {
        self.n_rec
    }

    /// Number of output rows in the file, counting `uv` stations twice.
    pub fn n_pair(&self) -> usize {
        self.n_pair
    }

    /// Read the next header/payload pair. `Ok(None)` at end of file.
    pub fn next_batch(&mut self) -> Result<Option<ConvRecord>> {
        let order = self.stream.byte_order();
        let header = match self.stream.next_record()? {
            Some(rec) => ConvHeader::parse(rec.as_bytes(), order)?,
            None => return Ok(None),
        };
        let payload = self
            .stream
            .next_record()?
            .ok_or(GsiError::UnexpectedEof("conventional payload"))?;
        trace!(
            variable = %header.variable,
            ii = header.ii,
            nreal = header.nreal,
            "Read conventional batch"
        );
        ConvRecord::decode(header, payload.as_bytes(), self.date, order, self.policy).map(Some)
    }
}

impl<R: Read + Seek> Iterator for ConvFile<R> {
    type Item = Result<ConvRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_batch().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Count header/payload pairs and output rows from the current position.
fn inventory<R: Read + Seek>(stream: &mut RecordStream<R>) -> Result<(usize, usize)> {
    let order = stream.byte_order();
    let mut n_rec = 0;
    let mut n_pair = 0;
    loop {
        let header = match stream.next_record()? {
            Some(rec) => ConvHeader::parse(rec.as_bytes(), order)?,
            None => break,
        };
        if stream.next_record()?.is_none() {
            return Err(GsiError::UnexpectedEof("conventional payload"));
        }
        n_rec += 1;
        n_pair += header.row_count();
    }
    Ok((n_rec, n_pair))
}
