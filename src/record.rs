//! Decoded observation rows handed to downstream consumers.
//!
//! [`ConvData`] is one conventional station observation; [`RadData`] is one
//! radiance observation for one channel. Values a file does not provide are
//! set to [`BAD_DATA`] / [`BAD_DATA_INT`], the missing-value convention the
//! downstream statistics tools expect.

use std::fmt;

/// Missing floating-point value.
pub const BAD_DATA: f64 = -9999.0;

/// Missing integer value.
pub const BAD_DATA_INT: i32 = -9999;

/// Whether `v` is the [`BAD_DATA`] sentinel.
pub fn is_bad_data(v: f64) -> bool {
    (v - BAD_DATA).abs() < 1.0e-4
}

/// Map a longitude into `[-180, 180]`, passing [`BAD_DATA`] through.
pub fn rescale_lon(lon: f64) -> f64 {
    if is_bad_data(lon) || !lon.is_finite() {
        return BAD_DATA;
    }
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let out = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // eastward wraps land on +180, not -180
    if out == -180.0 && lon > 0.0 { 180.0 } else { out }
}

/// Round to the nearest integer, half away from zero; bad stays bad.
pub(crate) fn nint(v: f64) -> i32 {
    if is_bad_data(v) || !v.is_finite() {
        BAD_DATA_INT
    } else {
        v.round() as i32
    }
}

/// `a - b`, or [`BAD_DATA`] if either side is missing.
pub(crate) fn difference(a: f64, b: f64) -> f64 {
    if is_bad_data(a) || is_bad_data(b) {
        BAD_DATA
    } else {
        a - b
    }
}

/// One conventional observation at one station.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvData {
    /// Variable code (`t`, `q`, `ps`, `uv`, ...; `u`/`v` after
    /// [`split_wind`](Self::split_wind)).
    pub var: String,
    /// Station identifier, at most 8 characters.
    pub sid: String,
    pub obtype: i32,
    pub lat: f64,
    pub lon: f64,
    /// Pressure in hPa, [`BAD_DATA`] for precipitable water.
    pub prs: f64,
    pub elv: f64,
    /// Observation height, [`BAD_DATA_INT`] when negative.
    pub hgt: i32,
    /// Analysis (forecast valid) time, Unix seconds.
    pub fcst_ut: i64,
    /// Observation time, Unix seconds.
    pub obs_ut: i64,
    pub obs: f64,
    pub guess: f64,
    /// Second wind component, `uv` only.
    pub obs_v: Option<f64>,
    pub guess_v: Option<f64>,
    pub obs_qc: i32,
    pub err_in: f64,
    pub err_adj: f64,
    pub err_fin: f64,
    pub prep_use: i32,
    pub anly_use: i32,
    pub setup_qc: i32,
    pub qc_wght: f64,
}

impl ConvData {
    /// Whether this row still carries both wind components.
    pub fn is_wind(&self) -> bool {
        self.obs_v.is_some()
    }

    /// Split a `uv` row into separate `u` and `v` rows.
    ///
    /// Returns `None` for rows without a second wind component.
    pub fn split_wind(&self) -> Option<(ConvData, ConvData)> {
        let obs_v = self.obs_v?;
        let guess_v = self.guess_v.unwrap_or(BAD_DATA);

        let mut u = self.clone();
        u.var = "u".into();
        u.obs_v = None;
        u.guess_v = None;

        let mut v = u.clone();
        v.var = "v".into();
        v.obs = obs_v;
        v.guess = guess_v;

        Some((u, v))
    }
}

impl fmt::Display for ConvData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.4}, {:.4}) prs={:.1} obs={:.4} guess={:.4}",
            self.var, self.sid, self.lat, self.lon, self.prs, self.obs, self.guess
        )
    }
}

/// One radiance observation for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RadData {
    /// `TB_NN`, where `NN` is the instrument channel number.
    pub var: String,
    pub channel: i32,
    /// Channel usage flag from the channel table.
    pub chan_use: i32,
    pub lat: f64,
    pub lon: f64,
    pub elv: f64,
    pub fcst_ut: i64,
    pub obs_ut: i64,
    /// Observed brightness temperature.
    pub obs: f64,
    /// Bias-corrected background brightness temperature.
    pub guess: f64,
    /// QC mark times the channel usage flag.
    pub obs_qc: i32,
    pub scan_pos: i32,
    pub sat_znth: f64,
    pub sat_azmth: f64,
    pub sun_znth: f64,
    pub sun_azmth: f64,
    pub sun_glnt: f64,
    pub frac_wtr: f64,
    pub frac_lnd: f64,
    pub frac_ice: f64,
    pub frac_snw: f64,
    pub sfc_twtr: f64,
    pub sfc_tlnd: f64,
    pub sfc_tice: f64,
    pub sfc_tsnw: f64,
    pub tsoil: f64,
    pub soilm: f64,
    pub land_type: i32,
    pub frac_veg: f64,
    pub snw_dpth: f64,
    pub sfc_wind: f64,
    pub frac_cld: f64,
    pub ctop_prs: f64,
    pub tfnd: f64,
    pub twarm: f64,
    pub tcool: f64,
    pub tzfnd: f64,
    pub obs_err: f64,
    /// Background brightness temperature without bias correction.
    pub fcst_nobc: f64,
    pub sfc_emis: f64,
    pub stability: f64,
    /// Pressure of the weighting-function peak, when the file has it.
    pub prs_max_wgt: f64,
}

impl fmt::Display for RadData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.4}, {:.4}) obs={:.4} guess={:.4} qc={}",
            self.var, self.lat, self.lon, self.obs, self.guess, self.obs_qc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wind_row() -> ConvData {
        ConvData {
            var: "uv".into(),
            sid: "72403".into(),
            obtype: 220,
            lat: 38.98,
            lon: -77.47,
            prs: 850.0,
            elv: 88.0,
            hgt: 1500,
            fcst_ut: 0,
            obs_ut: 0,
            obs: 3.0,
            guess: 2.5,
            obs_v: Some(-4.0),
            guess_v: Some(-3.0),
            obs_qc: 2,
            err_in: 0.4,
            err_adj: 0.4,
            err_fin: 0.35,
            prep_use: 1,
            anly_use: 1,
            setup_qc: BAD_DATA_INT,
            qc_wght: 1.0,
        }
    }

    #[test]
    fn test_rescale_lon() {
        assert_eq!(rescale_lon(282.5), -77.5);
        assert_eq!(rescale_lon(-190.0), 170.0);
        assert_eq!(rescale_lon(180.0), 180.0);
        assert_eq!(rescale_lon(BAD_DATA), BAD_DATA);
    }

    #[test]
    fn test_rescale_lon_far_out_of_range() {
        assert_eq!(rescale_lon(540.0), 180.0);
        assert_eq!(rescale_lon(-540.0), -180.0);
        assert_eq!(rescale_lon(-180.0), -180.0);
        assert_eq!(rescale_lon(720.0 + 10.5), 10.5);
        for lon in [1.0e12, -1.0e12, 1.0e20, -1.0e20, f64::from(f32::MAX)] {
            let r = rescale_lon(lon);
            assert!((-180.0..=180.0).contains(&r), "{lon} -> {r}");
        }
    }

    #[test]
    fn test_nint_half_away_from_zero() {
        assert_eq!(nint(2.5), 3);
        assert_eq!(nint(-2.5), -3);
        assert_eq!(nint(BAD_DATA), BAD_DATA_INT);
    }

    #[test]
    fn test_difference_propagates_bad() {
        assert_eq!(difference(5.0, 2.0), 3.0);
        assert_eq!(difference(BAD_DATA, 2.0), BAD_DATA);
        assert_eq!(difference(5.0, BAD_DATA), BAD_DATA);
    }

    #[test]
    fn test_split_wind() {
        let row = wind_row();
        assert!(row.is_wind());
        let (u, v) = row.split_wind().unwrap();
        assert_eq!(u.var, "u");
        assert_eq!(u.obs, 3.0);
        assert_eq!(u.guess, 2.5);
        assert_eq!(v.var, "v");
        assert_eq!(v.obs, -4.0);
        assert_eq!(v.guess, -3.0);
        assert_eq!(v.sid, "72403");
        assert!(!u.is_wind() && !v.is_wind());
    }

    #[test]
    fn test_split_wind_scalar_row() {
        let mut row = wind_row();
        row.var = "t".into();
        row.obs_v = None;
        row.guess_v = None;
        assert!(row.split_wind().is_none());
    }
}
