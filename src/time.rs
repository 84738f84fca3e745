//! GSI analysis dates.
//!
//! Diagnostic files carry the analysis time as a single integer packed as
//! decimal digits `YYYYMMDDHH`. [`AnalysisDate`] splits it and converts to
//! Unix seconds so observation offsets (in hours) can be applied.

use std::fmt;

/// Seconds per hour.
pub const SEC_PER_HOUR: f64 = 3600.0;

/// Analysis date split out of a packed `YYYYMMDDHH` integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisDate {
    pub year: i32,
    pub month: u32, // 1-12
    pub day: u32,   // 1-31
    pub hour: u32,  // 0-23
}

impl AnalysisDate {
    /// Split a packed `YYYYMMDDHH` value by decimal arithmetic.
    ///
    /// ```
    /// use gsi_diag_rs::AnalysisDate;
    ///
    /// let d = AnalysisDate::from_packed(2024_03_15_18);
    /// assert_eq!((d.year, d.month, d.day, d.hour), (2024, 3, 15, 18));
    /// ```
    pub fn from_packed(packed: i32) -> Self {
        Self {
            year: packed / 1_000_000,
            month: ((packed / 10_000) % 100).unsigned_abs(),
            day: ((packed / 100) % 100).unsigned_abs(),
            hour: (packed % 100).unsigned_abs(),
        }
    }

    /// Re-pack as `YYYYMMDDHH`.
    pub fn packed(&self) -> i32 {
        self.year * 1_000_000 + (self.month * 10_000 + self.day * 100 + self.hour) as i32
    }

    /// Seconds since 1970-01-01T00:00:00Z.
    pub fn unix_seconds(&self) -> i64 {
        days_from_civil(self.year, self.month, self.day) * 86_400 + i64::from(self.hour) * 3_600
    }

    /// Analysis time shifted by a (possibly fractional) number of hours,
    /// rounded to the nearest second.
    pub fn offset_seconds(&self, hours: f64) -> i64 {
        (self.unix_seconds() as f64 + hours * SEC_PER_HOUR).round() as i64
    }
}

impl fmt::Display for AnalysisDate {
    /// `YYYYMMDD_HH0000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}_{:02}0000",
            self.year, self.month, self.day, self.hour
        )
    }
}

/// Days since the Unix epoch for a proleptic Gregorian date.
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let era = y.div_euclid(400);
    let yoe = y - era * 400; // 0-399
    let m = i64::from(month);
    let mp = (m + 9) % 12; // March = 0
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
