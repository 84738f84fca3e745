//! Radiance (satellite brightness temperature) diagnostic files.
//!
//! File shape, one Fortran record per line:
//!
//! ```text
//! isis dplat obstype jiter nchanl npred idate ireal ipchan iextra jextra [idiag angord iversion inewpc]
//! freq plo wave varch tlap iuse nuchan ich      (nchanl records, 32 bytes each)
//! diag[ireal] diagchan[idiag, nchanl] [extra[iextra, jextra]]   (one per observation)
//! ...
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::config::ReaderConfig;
use crate::layout::{FieldKind, FieldSpec, Layout, decode_f32s, fortran_index};
use crate::offsets::rad::*;
use crate::record::{BAD_DATA, RadData, difference, is_bad_data, nint, rescale_lon};
use crate::stream::RecordStream;
use crate::time::AnalysisDate;
use crate::types::{ByteOrder, FormatParameters, PayloadPolicy};
use crate::{GsiError, Result};

/// Shortest metadata record accepted: everything up to and including `jextra`.
pub const MIN_PARAMS_LEN: usize = 72;

/// Exact length of a channel table record.
pub const CHANNEL_LEN: usize = 32;

const RAD_PARAMS: Layout = Layout {
    name: "radiance metadata",
    fields: &[
        FieldSpec::new("isis", 0, FieldKind::Text(20)),
        FieldSpec::new("dplat", 20, FieldKind::Text(10)),
        FieldSpec::new("obstype", 30, FieldKind::Text(10)),
        FieldSpec::new("jiter", 40, FieldKind::Int32),
        FieldSpec::new("nchanl", 44, FieldKind::Int32),
        FieldSpec::new("npred", 48, FieldKind::Int32),
        FieldSpec::new("idate", 52, FieldKind::Int32),
        FieldSpec::new("ireal", 56, FieldKind::Int32),
        FieldSpec::new("ipchan", 60, FieldKind::Int32),
        FieldSpec::new("iextra", 64, FieldKind::Int32),
        FieldSpec::new("jextra", 68, FieldKind::Int32),
        FieldSpec::new("idiag", 72, FieldKind::Int32),
        FieldSpec::new("angord", 76, FieldKind::Int32),
        FieldSpec::new("iversion", 80, FieldKind::Int32),
        FieldSpec::new("inewpc", 84, FieldKind::Int32),
    ],
};

const CHANNEL: Layout = Layout {
    name: "radiance channel",
    fields: &[
        FieldSpec::new("freq", 0, FieldKind::Float32),
        FieldSpec::new("plo", 4, FieldKind::Float32),
        FieldSpec::new("wave", 8, FieldKind::Float32),
        FieldSpec::new("varch", 12, FieldKind::Float32),
        FieldSpec::new("tlap", 16, FieldKind::Float32),
        FieldSpec::new("iuse", 20, FieldKind::Int32),
        FieldSpec::new("nuchan", 24, FieldKind::Int32),
        FieldSpec::new("ich", 28, FieldKind::Int32),
    ],
};

/// Per-file radiance metadata, the first record of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadParams {
    /// Sensor and satellite, e.g. `amsua_n15`.
    pub isis: String,
    pub dplat: String,
    pub obstype: String,
    /// Outer-loop iteration.
    pub jiter: i32,
    pub nchanl: i32,
    pub npred: i32,
    /// Analysis date, packed `YYYYMMDDHH`.
    pub idate: i32,
    /// Length of the `diag` block.
    pub ireal: i32,
    pub ipchan: i32,
    pub iextra: i32,
    pub jextra: i32,
    /// Fields per channel in the `diagchan` block. Zero in files that stop
    /// at `jextra`.
    pub idiag: i32,
    pub angord: i32,
    pub iversion: i32,
    pub inewpc: i32,
}

impl RadParams {
    pub fn parse(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        if bytes.len() < MIN_PARAMS_LEN {
            return Err(GsiError::BadRecordLength {
                what: "radiance metadata",
                expected: format!("at least {MIN_PARAMS_LEN}"),
                actual: bytes.len() as u64,
            });
        }
        let f = RAD_PARAMS.unpack(bytes, order);
        let params = Self {
            isis: f.text("isis")?.to_string(),
            dplat: f.text("dplat")?.to_string(),
            obstype: f.text("obstype")?.to_string(),
            jiter: f.int("jiter")?,
            nchanl: f.int("nchanl")?,
            npred: f.int("npred")?,
            idate: f.int("idate")?,
            ireal: f.int("ireal")?,
            ipchan: f.int("ipchan")?,
            iextra: f.int("iextra")?,
            jextra: f.int("jextra")?,
            idiag: f.int_or("idiag", 0),
            angord: f.int_or("angord", 0),
            iversion: f.int_or("iversion", 0),
            inewpc: f.int_or("inewpc", 0),
        };
        for (what, value) in [
            ("nchanl", params.nchanl),
            ("ireal", params.ireal),
            ("idiag", params.idiag),
            ("iextra", params.iextra),
            ("jextra", params.jextra),
        ] {
            if value < 0 {
                return Err(GsiError::NegativeDimension { what, value });
            }
        }
        if params.checked_payload_len().is_none() {
            return Err(GsiError::DimensionOverflow {
                what: "radiance payload",
            });
        }
        Ok(params)
    }

    pub fn date(&self) -> AnalysisDate {
        AnalysisDate::from_packed(self.idate)
    }

    /// Whether payloads carry an `extra` block.
    pub fn has_extra(&self) -> bool {
        self.iextra > 0 && self.jextra > 0
    }

    pub fn n_channels(&self) -> usize {
        dim(self.nchanl)
    }

    pub fn n_diag(&self) -> usize {
        dim(self.ireal)
    }

    /// Length of the `diagchan` block.
    pub fn n12(&self) -> usize {
        dim(self.idiag).saturating_mul(dim(self.nchanl))
    }

    pub fn n_extra(&self) -> usize {
        if self.has_extra() {
            dim(self.iextra).saturating_mul(dim(self.jextra))
        } else {
            0
        }
    }

    /// Byte length a well-formed payload record has. Saturates for
    /// dimensions [`parse`](Self::parse) would reject.
    pub fn payload_len(&self) -> usize {
        self.checked_payload_len().unwrap_or(usize::MAX)
    }

    fn checked_payload_len(&self) -> Option<usize> {
        let n12 = dim(self.idiag).checked_mul(dim(self.nchanl))?;
        let n_extra = if self.has_extra() {
            dim(self.iextra).checked_mul(dim(self.jextra))?
        } else {
            0
        };
        dim(self.ireal)
            .checked_add(n12)?
            .checked_add(n_extra)?
            .checked_mul(4)
    }
}

/// Negative counts read as zero.
fn dim(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

impl fmt::Display for RadParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "isis     = \"{}\"", self.isis)?;
        writeln!(f, "dplat    = \"{}\"", self.dplat)?;
        writeln!(f, "obstype  = \"{}\"", self.obstype)?;
        writeln!(f, "jiter    = {}", self.jiter)?;
        writeln!(f, "nchanl   = {}", self.nchanl)?;
        writeln!(f, "npred    = {}", self.npred)?;
        writeln!(f, "idate    = {}", self.idate)?;
        writeln!(f, "ireal    = {}", self.ireal)?;
        writeln!(f, "ipchan   = {}", self.ipchan)?;
        writeln!(f, "iextra   = {}", self.iextra)?;
        writeln!(f, "jextra   = {}", self.jextra)?;
        writeln!(f, "idiag    = {}", self.idiag)?;
        writeln!(f, "angord   = {}", self.angord)?;
        writeln!(f, "iversion = {}", self.iversion)?;
        write!(f, "inewpc   = {}", self.inewpc)
    }
}

/// One channel table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelParams {
    /// Frequency (GHz).
    pub freq: f32,
    /// Polarization.
    pub plo: f32,
    /// Wavenumber (cm^-1).
    pub wave: f32,
    /// Error variance.
    pub varch: f32,
    /// Mean lapse rate.
    pub tlap: f32,
    /// Usage flag: 1 if the channel was assimilated.
    pub iuse: i32,
    /// Instrument channel number.
    pub nuchan: i32,
    /// GSI internal channel index.
    pub ich: i32,
}

impl ChannelParams {
    pub fn parse(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        if bytes.len() != CHANNEL_LEN {
            return Err(GsiError::BadRecordLength {
                what: "radiance channel",
                expected: CHANNEL_LEN.to_string(),
                actual: bytes.len() as u64,
            });
        }
        let f = CHANNEL.unpack(bytes, order);
        Ok(Self {
            freq: f.float("freq")?,
            plo: f.float("plo")?,
            wave: f.float("wave")?,
            varch: f.float("varch")?,
            tlap: f.float("tlap")?,
            iuse: f.int("iuse")?,
            nuchan: f.int("nuchan")?,
            ich: f.int("ich")?,
        })
    }
}

/// One observation time: scalar `diag` fields plus a `diagchan` slice per
/// channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RadRecord {
    pub date: AnalysisDate,
    diag: Vec<f32>,
    diagchan: Vec<f32>,
    extra: Option<Vec<f32>>,
    /// Fields per channel.
    n1: usize,
    /// Channel count.
    n2: usize,
    iextra: usize,
    jextra: usize,
}

impl RadRecord {
    /// Split a payload record into its blocks.
    ///
    /// A payload whose length differs from [`RadParams::payload_len`] is an
    /// error under [`PayloadPolicy::Strict`]; under
    /// [`PayloadPolicy::Lenient`] each block takes what the payload holds.
    pub fn decode(
        params: &RadParams,
        payload: &[u8],
        order: ByteOrder,
        policy: PayloadPolicy,
    ) -> Result<Self> {
        let expected = params.payload_len();
        if payload.len() != expected {
            match policy {
                PayloadPolicy::Strict => {
                    return Err(GsiError::BadRecordLength {
                        what: "radiance payload",
                        expected: expected.to_string(),
                        actual: payload.len() as u64,
                    });
                }
                PayloadPolicy::Lenient => warn!(
                    isis = %params.isis,
                    expected,
                    actual = payload.len(),
                    "Radiance payload size mismatch"
                ),
            }
        }

        let values = decode_f32s(payload, order);
        let mut rest = values.as_slice();
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n.min(rest.len()));
            rest = tail;
            head.to_vec()
        };
        let diag = take(params.n_diag());
        let diagchan = take(params.n12());
        let extra = params.has_extra().then(|| take(params.n_extra()));

        Ok(Self {
            date: params.date(),
            diag,
            diagchan,
            extra,
            n1: dim(params.idiag),
            n2: params.n_channels(),
            iextra: dim(params.iextra),
            jextra: dim(params.jextra),
        })
    }

    pub fn n_diag(&self) -> usize {
        self.diag.len()
    }

    pub fn n_channels(&self) -> usize {
        self.n2
    }

    pub fn has_extra(&self) -> bool {
        self.extra.is_some()
    }

    /// Zero-based `diag(index)`.
    pub fn diag_data(&self, index: usize) -> Result<f64> {
        self.diag
            .get(index)
            .map(|&v| f64::from(v))
            .ok_or(GsiError::IndexOutOfRange {
                what: "diag field",
                index,
                len: self.diag.len(),
            })
    }

    /// Zero-based `diagchan(field, channel)`.
    pub fn diagchan_data(&self, field: usize, channel: usize) -> Result<f64> {
        if field >= self.n1 {
            return Err(GsiError::IndexOutOfRange {
                what: "diagchan field",
                index: field,
                len: self.n1,
            });
        }
        if channel >= self.n2 {
            return Err(GsiError::IndexOutOfRange {
                what: "channel",
                index: channel,
                len: self.n2,
            });
        }
        let n = fortran_index(self.n1, field, channel);
        self.diagchan
            .get(n)
            .map(|&v| f64::from(v))
            .ok_or(GsiError::IndexOutOfRange {
                what: "diagchan block",
                index: n,
                len: self.diagchan.len(),
            })
    }

    /// Zero-based `extra(i, j)`.
    pub fn extra_data(&self, i: usize, j: usize) -> Result<f64> {
        let extra = self.extra.as_ref().ok_or(GsiError::NoExtraBlock)?;
        if i >= self.iextra {
            return Err(GsiError::IndexOutOfRange {
                what: "extra field",
                index: i,
                len: self.iextra,
            });
        }
        if j >= self.jextra {
            return Err(GsiError::IndexOutOfRange {
                what: "extra column",
                index: j,
                len: self.jextra,
            });
        }
        let n = fortran_index(self.iextra, i, j);
        extra
            .get(n)
            .map(|&v| f64::from(v))
            .ok_or(GsiError::IndexOutOfRange {
                what: "extra block",
                index: n,
                len: extra.len(),
            })
    }

    /// Extract the row for channel slot `channel` (0-based position in the
    /// channel table).
    ///
    /// Fields beyond what the file provides come back as [`BAD_DATA`].
    pub fn channel_row(&self, channel: usize, params: &ChannelParams) -> Result<RadData> {
        if channel >= self.n2 {
            return Err(GsiError::IndexOutOfRange {
                what: "channel",
                index: channel,
                len: self.n2,
            });
        }
        let diag = |index: usize| self.diag_data(index - 1).unwrap_or(BAD_DATA);
        let chan = |index: usize| self.diagchan_data(index - 1, channel).unwrap_or(BAD_DATA);

        let fcst_ut = self.date.unix_seconds();
        let dtime = diag(DTIME);
        let obs_ut = if is_bad_data(dtime) {
            fcst_ut
        } else {
            self.date.offset_seconds(dtime)
        };

        let obs = chan(BTEMP_CHAN);
        let qc = nint(chan(QC_MARK));
        let prs_max_wgt = match self.extra_data(EXTRA_PRS_MAX_WGT - 1, channel) {
            Ok(v) if v <= PRS_MAX_WGT_LIMIT => v,
            _ => BAD_DATA,
        };

        Ok(RadData {
            var: format!("TB_{:02}", params.nuchan),
            channel: params.nuchan,
            chan_use: params.iuse,
            lat: diag(LAT),
            lon: rescale_lon(diag(LON)),
            elv: diag(ELEVATION),
            fcst_ut,
            obs_ut,
            obs,
            guess: difference(obs, chan(OMG_BC_CHAN)),
            obs_qc: if is_bad_data(f64::from(qc)) {
                qc
            } else {
                qc * params.iuse
            },
            scan_pos: nint(diag(SCANPOS)),
            sat_znth: diag(SAT_ZENITH),
            sat_azmth: diag(SAT_AZIMUTH),
            sun_znth: diag(SUN_ZENITH),
            sun_azmth: diag(SUN_AZIMUTH),
            sun_glnt: diag(GLINT),
            frac_wtr: diag(WATER_FRAC),
            frac_lnd: diag(LAND_FRAC),
            frac_ice: diag(ICE_FRAC),
            frac_snw: diag(SNOW_FRAC),
            sfc_twtr: diag(WATER_TEMP),
            sfc_tlnd: diag(LAND_TEMP),
            sfc_tice: diag(ICE_TEMP),
            sfc_tsnw: diag(SNOW_TEMP),
            tsoil: diag(SOIL_TEMP),
            soilm: diag(SOIL_MOISTURE),
            land_type: nint(diag(LAND_TYPE)),
            frac_veg: diag(VEG_FRAC),
            snw_dpth: diag(SNOW_DEPTH),
            sfc_wind: diag(WIND_SPEED),
            frac_cld: diag(CLOUD_FRAC),
            ctop_prs: diag(CLOUD_TOP_PRESSURE),
            tfnd: diag(ITREF),
            twarm: diag(IDTW),
            tcool: diag(IDTC),
            tzfnd: diag(ITZ_TR),
            obs_err: chan(INV_CHAN),
            fcst_nobc: difference(obs, chan(OMG_NOBC_CHAN)),
            sfc_emis: chan(SURF_EM),
            stability: chan(STABILITY),
            prs_max_wgt,
        })
    }

    /// One row per channel, in channel table order.
    pub fn rows(&self, channels: &[ChannelParams]) -> Result<Vec<RadData>> {
        channels
            .iter()
            .take(self.n2)
            .enumerate()
            .map(|(i, c)| self.channel_row(i, c))
            .collect()
    }
}

/// Reader for a radiance diagnostic file.
///
/// Opening reads the metadata record and channel table and takes an
/// inventory of the payloads; [`next_batch`](Self::next_batch) (or the
/// [`Iterator`] impl) then yields one [`RadRecord`] per observation.
#[derive(Debug)]
pub struct RadFile<R> {
    stream: RecordStream<R>,
    params: RadParams,
    channels: Vec<ChannelParams>,
    policy: PayloadPolicy,
    n_rec: usize,
    done: bool,
}

impl RadFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let stream = RecordStream::open(path, config)?;
        Self::from_stream(stream, config)
    }
}

impl<R: Read + Seek> RadFile<R> {
    pub fn from_source(source: R, config: &ReaderConfig) -> Result<Self> {
        let stream = RecordStream::from_source(source, config)?;
        Self::from_stream(stream, config)
    }

    /// Take over a stream positioned at the metadata record.
    pub fn from_stream(mut stream: RecordStream<R>, config: &ReaderConfig) -> Result<Self> {
        let order = stream.byte_order();
        let params = match stream.next_record()? {
            Some(rec) => RadParams::parse(rec.as_bytes(), order)?,
            None => return Err(GsiError::UnexpectedEof("radiance metadata")),
        };

        // nchanl is untrusted; grow as records arrive.
        let mut channels = Vec::new();
        for _ in 0..params.n_channels() {
            let channel = match stream.next_record()? {
                Some(rec) => ChannelParams::parse(rec.as_bytes(), order)?,
                None => return Err(GsiError::UnexpectedEof("radiance channel table")),
            };
            channels.push(channel);
        }

        let data_start = stream.position()?;
        let mut n_rec = 0;
        while stream.next_record()?.is_some() {
            n_rec += 1;
        }
        stream.seek_to(data_start)?;

        debug!(
            isis = %params.isis,
            date = %params.date(),
            nchanl = params.nchanl,
            n_rec,
            format = %stream.format(),
            "Opened radiance file"
        );

        Ok(Self {
            stream,
            params,
            channels,
            policy: config.payload_policy.unwrap_or(PayloadPolicy::Lenient),
            n_rec,
            done: false,
        })
    }

    pub fn params(&self) -> &RadParams {
        &self.params
    }

    pub fn channels(&self) -> &[ChannelParams] {
        &self.channels
    }

    pub fn date(&self) -> AnalysisDate {
        self.params.date()
    }

    pub fn format(&self) -> FormatParameters {
        self.stream.format()
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of payload records (observation times).
    pub fn n_rec(&self) -> usize {
        self.n_rec
    }

    /// Number of (observation, channel) rows in the file.
    pub fn n_pair(&self) -> usize {
        self.n_rec * self.channels.len()
    }

    /// Instrument channel number of channel slot `n`.
    pub fn channel_val(&self, n: usize) -> Result<i32> {
        self.channel(n).map(|c| c.nuchan)
    }

    /// Usage flag of channel slot `n`.
    pub fn use_channel(&self, n: usize) -> Result<i32> {
        self.channel(n).map(|c| c.iuse)
    }

    /// Channel slots whose instrument channel number is in `wanted`, in
    /// table order. An empty selection means every channel.
    pub fn channel_indices(&self, wanted: &[i32]) -> Vec<usize> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| wanted.is_empty() || wanted.contains(&c.nuchan))
            .map(|(i, _)| i)
            .collect()
    }

    /// Read the next observation. `Ok(None)` at end of file.
    pub fn next_batch(&mut self) -> Result<Option<RadRecord>> {
        let order = self.stream.byte_order();
        let Some(rec) = self.stream.next_record()? else {
            return Ok(None);
        };
        trace!(length = rec.len(), "Read radiance payload");
        RadRecord::decode(&self.params, rec.as_bytes(), order, self.policy).map(Some)
    }

    fn channel(&self, n: usize) -> Result<&ChannelParams> {
        self.channels.get(n).ok_or(GsiError::IndexOutOfRange {
            what: "channel",
            index: n,
            len: self.channels.len(),
        })
    }
}

impl<R: Read + Seek> Iterator for RadFile<R> {
    type Item = Result<RadRecord>;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PayloadBuilder, frame};
    use crate::types::PadWidth;
    use std::io::Cursor;

    fn format() -> FormatParameters {
        FormatParameters::from_byte_order(PadWidth::Four, ByteOrder::Little)
    }

    fn params_record(nchanl: i32, ireal: i32, idiag: i32, extra: (i32, i32)) -> Vec<u8> {
        PayloadBuilder::new(format())
            .text("amsua_n15", 20)
            .text("n15", 10)
            .text("amsua", 10)
            .int(1)
            .int(nchanl)
            .int(12)
            .int(2024_03_15_18)
            .int(ireal)
            .int(7)
            .int(extra.0)
            .int(extra.1)
            .int(idiag)
            .int(4)
            .int(30_303)
            .int(1)
            .build()
    }

    fn channel_record(nuchan: i32, iuse: i32) -> Vec<u8> {
        PayloadBuilder::new(format())
            .floats(&[23.8, 0.0, 0.79, 2.5, 0.1])
            .int(iuse)
            .int(nuchan)
            .int(nuchan)
            .build()
    }

    fn params(nchanl: i32, ireal: i32, idiag: i32, extra: (i32, i32)) -> RadParams {
        RadParams::parse(
            &params_record(nchanl, ireal, idiag, extra),
            ByteOrder::Little,
        )
        .unwrap()
    }

    /// `diag = [45, 270, 12, -0.5, 15]`, `diagchan(f, c) = 10 * c + f`.
    fn payload(ireal: usize, idiag: usize, nchanl: usize, extra: &[f32]) -> Vec<u8> {
        let diag = [45.0, 270.0, 12.0, -0.5, 15.0, 10.0, 20.0];
        let mut b = PayloadBuilder::new(format()).floats(&diag[..ireal]);
        for c in 0..nchanl {
            for f in 0..idiag {
                b = b.float((10 * c + f) as f32);
            }
        }
        b.floats(extra).build()
    }

    #[test]
    fn test_params_parse_full() {
        let p = params(3, 5, 4, (0, 0));
        assert_eq!(p.isis, "amsua_n15");
        assert_eq!(p.dplat, "n15");
        assert_eq!(p.obstype, "amsua");
        assert_eq!(p.nchanl, 3);
        assert_eq!(p.idiag, 4);
        assert_eq!(p.iversion, 30_303);
        assert_eq!(p.date(), AnalysisDate::from_packed(2024_03_15_18));
        assert!(!p.has_extra());
        assert_eq!(p.payload_len(), 68);
    }

    #[test]
    fn test_params_minimum_record() {
        let bytes = params_record(3, 5, 4, (0, 0));
        let p = RadParams::parse(&bytes[..MIN_PARAMS_LEN], ByteOrder::Little).unwrap();
        assert_eq!(p.jextra, 0);
        assert_eq!(p.idiag, 0);
        assert_eq!(p.inewpc, 0);

        let err = RadParams::parse(&bytes[..MIN_PARAMS_LEN - 1], ByteOrder::Little).unwrap_err();
        assert!(matches!(err, GsiError::BadRecordLength { actual: 71, .. }));
    }

    #[test]
    fn test_params_dimension_overflow() {
        let bytes = params_record(2, i32::MAX, i32::MAX, (i32::MAX, i32::MAX));
        let err = RadParams::parse(&bytes, ByteOrder::Little).unwrap_err();
        assert!(matches!(
            err,
            GsiError::DimensionOverflow {
                what: "radiance payload"
            }
        ));

        let mut p = params(2, 5, 4, (0, 0));
        p.ireal = i32::MAX;
        p.idiag = i32::MAX;
        p.iextra = i32::MAX;
        p.jextra = i32::MAX;
        assert_eq!(p.payload_len(), usize::MAX);
        let r = RadRecord::decode(&p, &payload(5, 4, 2, &[]), ByteOrder::Little, PayloadPolicy::Lenient)
            .unwrap();
        assert_eq!(r.n_diag(), 13);
        assert!(matches!(
            r.extra_data(0, 1),
            Err(GsiError::IndexOutOfRange { what: "extra block", .. })
        ));
    }

    #[test]
    fn test_params_display() {
        let dump = params(3, 5, 4, (0, 0)).to_string();
        assert!(dump.starts_with("isis     = \"amsua_n15\"\n"));
        assert!(dump.contains("nchanl   = 3\n"));
        assert!(dump.ends_with("inewpc   = 1"));
    }

    #[test]
    fn test_channel_record_length() {
        let c = ChannelParams::parse(&channel_record(5, 1), ByteOrder::Little).unwrap();
        assert_eq!(c.nuchan, 5);
        assert_eq!(c.iuse, 1);
        assert_eq!(c.freq, 23.8);

        let mut long = channel_record(5, 1);
        long.push(0);
        assert!(ChannelParams::parse(&long, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_record_addressing() {
        let p = params(3, 5, 4, (0, 0));
        let r = RadRecord::decode(&p, &payload(5, 4, 3, &[]), ByteOrder::Little, PayloadPolicy::Strict)
            .unwrap();
        assert_eq!(r.diag_data(0).unwrap(), 45.0);
        assert_eq!(r.diag_data(4).unwrap(), 15.0);
        assert_eq!(r.diagchan_data(2, 1).unwrap(), 12.0);
        assert_eq!(r.diagchan_data(3, 2).unwrap(), 23.0);
        assert!(r.diagchan_data(4, 0).is_err());
        assert!(r.diagchan_data(0, 3).is_err());
        assert!(matches!(r.extra_data(0, 0), Err(GsiError::NoExtraBlock)));
    }

    #[test]
    fn test_extra_block() {
        let p = params(2, 5, 4, (1, 2));
        assert_eq!(p.payload_len(), 4 * (5 + 8 + 2));
        let r = RadRecord::decode(
            &p,
            &payload(5, 4, 2, &[850.0, 2.0e9]),
            ByteOrder::Little,
            PayloadPolicy::Strict,
        )
        .unwrap();
        assert_eq!(r.extra_data(0, 1).unwrap(), 2.0e9);

        let chans = [
            ChannelParams::parse(&channel_record(1, 1), ByteOrder::Little).unwrap(),
            ChannelParams::parse(&channel_record(2, 1), ByteOrder::Little).unwrap(),
        ];
        let rows = r.rows(&chans).unwrap();
        assert_eq!(rows[0].prs_max_wgt, 850.0);
        assert_eq!(rows[1].prs_max_wgt, BAD_DATA);
    }

    #[test]
    fn test_channel_row() {
        let p = params(3, 5, 4, (0, 0));
        let r = RadRecord::decode(&p, &payload(5, 4, 3, &[]), ByteOrder::Little, PayloadPolicy::Strict)
            .unwrap();
        let c = ChannelParams::parse(&channel_record(7, -1), ByteOrder::Little).unwrap();
        let row = r.channel_row(1, &c).unwrap();

        assert_eq!(row.var, "TB_07");
        assert_eq!(row.lat, 45.0);
        assert_eq!(row.lon, -90.0);
        assert_eq!(row.obs_ut, r.date.unix_seconds() - 1_800);
        assert_eq!(row.scan_pos, 15);
        assert_eq!(row.obs, 10.0);
        assert_eq!(row.guess, -1.0);
        assert_eq!(row.fcst_nobc, -2.0);
        assert_eq!(row.obs_err, 13.0);
        // qc mark comes from field 5, beyond idiag = 4
        assert_eq!(row.obs_qc, crate::record::BAD_DATA_INT);
        assert_eq!(row.sat_znth, BAD_DATA);
        assert_eq!(row.prs_max_wgt, BAD_DATA);
    }

    #[test]
    fn test_channel_row_huge_longitude() {
        let p = params(1, 5, 4, (0, 0));
        let bytes = PayloadBuilder::new(format())
            .floats(&[45.0, 1.0e20, 12.0, -0.5, 15.0])
            .floats(&[280.0, 1.0, 2.0, 3.0])
            .build();
        let r = RadRecord::decode(&p, &bytes, ByteOrder::Little, PayloadPolicy::Strict).unwrap();
        let c = ChannelParams::parse(&channel_record(1, 1), ByteOrder::Little).unwrap();
        let row = r.channel_row(0, &c).unwrap();
        assert!((-180.0..=180.0).contains(&row.lon));
    }

    #[test]
    fn test_qc_scaled_by_usage() {
        let p = params(1, 5, 7, (0, 0));
        let r = RadRecord::decode(&p, &payload(5, 7, 1, &[]), ByteOrder::Little, PayloadPolicy::Strict)
            .unwrap();
        let c = ChannelParams::parse(&channel_record(4, -1), ByteOrder::Little).unwrap();
        assert_eq!(r.channel_row(0, &c).unwrap().obs_qc, -4);
    }

    #[test]
    fn test_lenient_short_payload() {
        let p = params(3, 5, 4, (0, 0));
        let mut bytes = payload(5, 4, 3, &[]);
        bytes.truncate(bytes.len() - 8);

        let err = RadRecord::decode(&p, &bytes, ByteOrder::Little, PayloadPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, GsiError::BadRecordLength { .. }));

        let r = RadRecord::decode(&p, &bytes, ByteOrder::Little, PayloadPolicy::Lenient).unwrap();
        assert_eq!(r.diagchan_data(1, 2).unwrap(), 21.0);
        assert!(r.diagchan_data(2, 2).is_err());
    }

    fn file(nchanl: usize, n_obs: usize) -> Vec<u8> {
        let mut data = frame(&params_record(nchanl as i32, 5, 4, (0, 0)), format());
        for c in 0..nchanl {
            data.extend(frame(&channel_record(c as i32 + 1, 1), format()));
        }
        for _ in 0..n_obs {
            data.extend(frame(&payload(5, 4, nchanl, &[]), format()));
        }
        data
    }

    #[test]
    fn test_file_inventory() {
        let mut f = RadFile::from_source(Cursor::new(file(3, 2)), &ReaderConfig::new()).unwrap();
        assert_eq!(f.format(), format());
        assert_eq!(f.n_channels(), 3);
        assert_eq!(f.n_rec(), 2);
        assert_eq!(f.n_pair(), 6);
        assert_eq!(f.channel_val(2).unwrap(), 3);
        assert_eq!(f.use_channel(0).unwrap(), 1);
        assert!(f.channel_val(3).is_err());
        assert_eq!(f.channel_indices(&[1, 3, 9]), vec![0, 2]);
        assert_eq!(f.channel_indices(&[]), vec![0, 1, 2]);

        let r = f.next_batch().unwrap().unwrap();
        let rows = r.rows(f.channels()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].var, "TB_03");
        assert!(f.next_batch().unwrap().is_some());
        assert!(f.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_huge_channel_count_hits_eof() {
        let data = frame(&params_record(i32::MAX, 5, 4, (0, 0)), format());
        let err = RadFile::from_source(Cursor::new(data), &ReaderConfig::new()).unwrap_err();
        assert!(matches!(
            err,
            GsiError::UnexpectedEof("radiance channel table")
        ));
    }

    #[test]
    fn test_truncated_channel_table() {
        let mut data = frame(&params_record(3, 5, 4, (0, 0)), format());
        data.extend(frame(&channel_record(1, 1), format()));
        let err = RadFile::from_source(Cursor::new(data), &ReaderConfig::new()).unwrap_err();
        assert!(matches!(
            err,
            GsiError::UnexpectedEof("radiance channel table")
        ));
    }

    #[test]
    fn test_inventory_rejects_pad_mismatch() {
        let mut data = file(2, 1);
        // payload whose trailing pad disagrees
        let mut bad = frame(&payload(5, 4, 2, &[]), format());
        let n = bad.len();
        bad[n - 4] ^= 0x01;
        data.extend(bad);

        let config = ReaderConfig::new().with_format(format());
        let stream = RecordStream::from_source(Cursor::new(data), &config).unwrap();
        let err = RadFile::from_stream(stream, &config).unwrap_err();
        assert!(matches!(err, GsiError::PadMismatch { .. }));
    }
}
