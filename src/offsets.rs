//! Field positions inside GSI diagnostic payloads.
//!
//! All indices are 1-based, as written in the GSI `setup*.f90` routines that
//! fill `rdiagbuf` and `diagbuf`. Subtract one before addressing.

/// Conventional `rdiag` row: one column per station.
pub mod conv {
    pub const OBSTYPE: usize = 1;
    pub const OBS_SUBTYPE: usize = 2;
    pub const LAT: usize = 3;
    pub const LON: usize = 4;
    pub const ELEVATION: usize = 5; // station elevation (m)
    pub const PRESSURE: usize = 6; // hPa
    pub const HEIGHT: usize = 7;
    pub const OBS_HOURS: usize = 8; // relative to analysis time
    pub const INPUT_QC: usize = 9; // prepbufr qc or event mark
    pub const SETUP_QC: usize = 10;
    pub const USAGE: usize = 11; // read_prepbufr usage flag
    pub const ANALYSIS_USE: usize = 12; // 1 = used, -1 = rejected
    pub const QC_WEIGHT: usize = 13; // nonlinear qc relative weight
    pub const PB_INVERSE: usize = 14; // prepbufr inverse obs error
    pub const READ_PB_INVERSE: usize = 15; // read_prepbufr inverse obs error
    pub const FINAL_INVERSE: usize = 16; // final inverse obs error
    pub const OBS_DATA: usize = 17; // u for wind
    pub const OMG: usize = 18; // obs minus guess, bias corrected
    pub const OMG_NO_BIAS: usize = 19;
    pub const OBS_V_DATA: usize = 20;
    pub const OMG_V: usize = 21;
    pub const OMG_V_NO_BIAS: usize = 22;

    /// Setup-QC value GSI writes when no setup QC was applied.
    pub const BAD_SETUP_QC: i32 = 100;
}

/// Radiance `diag` (per observation), `diagchan` (per channel) and `extra`
/// blocks.
pub mod rad {
    pub const LAT: usize = 1;
    pub const LON: usize = 2;
    pub const ELEVATION: usize = 3;
    pub const DTIME: usize = 4; // hours relative to analysis time
    pub const SCANPOS: usize = 5;
    pub const SAT_ZENITH: usize = 6;
    pub const SAT_AZIMUTH: usize = 7;
    pub const SUN_ZENITH: usize = 8;
    pub const SUN_AZIMUTH: usize = 9;
    pub const GLINT: usize = 10;
    pub const WATER_FRAC: usize = 11;
    pub const LAND_FRAC: usize = 12;
    pub const ICE_FRAC: usize = 13;
    pub const SNOW_FRAC: usize = 14;
    pub const WATER_TEMP: usize = 15;
    pub const LAND_TEMP: usize = 16;
    pub const ICE_TEMP: usize = 17;
    pub const SNOW_TEMP: usize = 18;
    pub const SOIL_TEMP: usize = 19;
    pub const SOIL_MOISTURE: usize = 20;
    pub const LAND_TYPE: usize = 21;
    pub const VEG_FRAC: usize = 22;
    pub const SNOW_DEPTH: usize = 23;
    pub const WIND_SPEED: usize = 24; // surface
    pub const CLOUD_FRAC: usize = 25;
    pub const CLOUD_TOP_PRESSURE: usize = 26;
    pub const ITREF: usize = 27; // foundation temperature
    pub const IDTW: usize = 28; // diurnal warming
    pub const IDTC: usize = 29; // sub-layer cooling
    pub const ITZ_TR: usize = 30; // d(Tz)/d(Tr)

    pub const BTEMP_CHAN: usize = 1;
    pub const OMG_BC_CHAN: usize = 2;
    pub const OMG_NOBC_CHAN: usize = 3;
    pub const INV_CHAN: usize = 4;
    pub const QC_MARK: usize = 5;
    pub const SURF_EM: usize = 6;
    pub const STABILITY: usize = 7;

    pub const EXTRA_PRS_MAX_WGT: usize = 1;

    /// `prs_max_wgt` values above this are GSI fill values.
    pub const PRS_MAX_WGT_LIMIT: f64 = 1.0e8;
}
