//! Calendar-to-Julian time reduction.
//!
//! Reduces a calendar instant (with UTC offset and ΔUT1 applied) to the
//! Julian Day and the ephemeris day/century/millennium arguments the series
//! evaluations consume, plus the inverse reconstruction and an Espenak &
//! Meeus ΔT estimate for callers without a measured value.

#![allow(clippy::unreadable_literal)]
#![allow(clippy::many_single_char_names)]

use crate::math::{floor, polynomial};
use crate::types::{CalendarTime, TimeDeltas};
use crate::{Error, Result};
#[cfg(feature = "chrono")]
use chrono::Datelike;

/// Seconds per day.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian Day of the J2000.0 epoch (2000-01-01 12:00:00 TT).
const J2000_JDN: f64 = 2_451_545.0;

/// Days per Julian century.
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// First Julian Day of the Gregorian calendar (1582-10-15).
const GREGORIAN_START_JD: f64 = 2_299_160.0;

/// Earliest year the reduction is validated for.
const MIN_YEAR: i32 = -2000;

/// Latest year the reduction is validated for.
const MAX_YEAR: i32 = 6000;

/// Julian date with its ephemeris offset.
///
/// `jd` is referenced to UT1 (the ΔUT1 correction is already folded in);
/// the ephemeris variants add ΔT on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JulianDate {
    /// Julian Date referenced to UT1.
    jd: f64,
    /// ΔT in seconds (TT − UT1).
    delta_t: f64,
}

impl JulianDate {
    /// Reduces a calendar instant and its time corrections to a Julian date.
    ///
    /// The UTC offset is subtracted from the hour term and ΔUT1 added to the
    /// seconds term before the Gregorian reduction, so the result is
    /// referenced to UT1.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` for calendar fields that do not resolve to a
    /// valid instant (bad month/day/hour ranges, the 1582-10-05..14 gap) or
    /// for years outside the validated -2000..6000 range.
    pub fn from_calendar(time: &CalendarTime, deltas: &TimeDeltas) -> Result<Self> {
        check_calendar_fields(time)?;

        let day_decimal = f64::from(time.day)
            + (f64::from(time.hour) - time.utc_offset
                + (f64::from(time.minute) + (time.second + deltas.delta_ut1) / 60.0) / 60.0)
                / 24.0;
        let jd = julian_day_number(time.year, time.month, day_decimal);

        Ok(Self {
            jd,
            delta_t: deltas.delta_t,
        })
    }

    /// Gets the Julian Date referenced to UT1.
    #[must_use]
    pub const fn julian_date(&self) -> f64 {
        self.jd
    }

    /// Gets the ΔT value in seconds.
    #[must_use]
    pub const fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Julian Ephemeris Day: JD + ΔT/86400.
    #[must_use]
    pub fn julian_ephemeris_day(&self) -> f64 {
        self.jd + self.delta_t / SECONDS_PER_DAY
    }

    /// Julian centuries since J2000.0.
    #[must_use]
    pub fn julian_century(&self) -> f64 {
        (self.jd - J2000_JDN) / DAYS_PER_CENTURY
    }

    /// Julian ephemeris centuries since J2000.0.
    #[must_use]
    pub fn julian_ephemeris_century(&self) -> f64 {
        (self.julian_ephemeris_day() - J2000_JDN) / DAYS_PER_CENTURY
    }

    /// Julian ephemeris millennia since J2000.0.
    #[must_use]
    pub fn julian_ephemeris_millennium(&self) -> f64 {
        self.julian_ephemeris_century() / 10.0
    }

    /// Reconstructs the UT calendar instant for this Julian date.
    ///
    /// Inverse of the Gregorian reduction (Meeus, ch. 7). The result carries
    /// a zero UTC offset; seconds are fractional and recover the input to
    /// floating precision.
    #[must_use]
    pub fn to_utc_calendar(&self) -> CalendarTime {
        let shifted = self.jd + 0.5;
        let z = floor(shifted);
        let f = shifted - z;

        let a = if z < GREGORIAN_START_JD + 1.0 {
            z
        } else {
            let alpha = floor((z - 1_867_216.25) / 36_524.25);
            z + 1.0 + alpha - floor(alpha / 4.0)
        };
        let b = a + 1524.0;
        let c = floor((b - 122.1) / 365.25);
        let d = floor(365.25 * c);
        let e = floor((b - d) / 30.6001);

        let day_decimal = b - d - floor(30.6001 * e) + f;
        let day = floor(day_decimal);
        let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
        let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

        let hours = (day_decimal - day) * 24.0;
        let hour = floor(hours);
        let minutes = (hours - hour) * 60.0;
        let minute = floor(minutes);
        let second = (minutes - minute) * 60.0;

        CalendarTime {
            year: year as i32,
            month: month as u32,
            day: day as u32,
            hour: hour as u32,
            minute: minute as u32,
            second,
            utc_offset: 0.0,
        }
    }

    /// Builds a Julian date directly from a day number (used by the
    /// rise/transit/set solve, which works from 0 UT of a calendar date).
    pub(crate) const fn from_parts(jd: f64, delta_t: f64) -> Self {
        Self { jd, delta_t }
    }
}

/// Gregorian/Julian day-number reduction for a fractional day.
fn julian_day_number(year: i32, month: u32, day_decimal: f64) -> f64 {
    let mut y = year;
    let mut m = month as i32;

    // January and February count as months 13 and 14 of the previous year.
    if m < 3 {
        y -= 1;
        m += 12;
    }

    let mut jd = floor(365.25 * (f64::from(y) + 4716.0)) + floor(30.6001 * f64::from(m + 1))
        + day_decimal
        - 1524.5;

    if jd > GREGORIAN_START_JD {
        let a = floor(f64::from(y) / 100.0);
        jd += 2.0 - a + floor(a / 4.0);
    }

    jd
}

fn check_calendar_fields(time: &CalendarTime) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&time.year) {
        return Err(Error::invalid_datetime(
            "year must be between -2000 and 6000",
        ));
    }
    if !(1..=12).contains(&time.month) {
        return Err(Error::invalid_datetime("month must be between 1 and 12"));
    }
    if time.hour > 23 {
        return Err(Error::invalid_datetime("hour must be between 0 and 23"));
    }
    if time.minute > 59 {
        return Err(Error::invalid_datetime("minute must be between 0 and 59"));
    }
    if !(0.0..60.0).contains(&time.second) {
        return Err(Error::invalid_datetime(
            "second must be between 0 and 59.999...",
        ));
    }
    if time.day == 0 || time.day > days_in_month(time.year, time.month, time.day)? {
        return Err(Error::invalid_datetime("day is out of range for month"));
    }
    Ok(())
}

const fn is_gregorian_date(year: i32, month: u32, day: u32) -> bool {
    year > 1582 || (year == 1582 && (month > 10 || (month == 10 && day >= 15)))
}

const fn is_leap_year(year: i32, is_gregorian: bool) -> bool {
    if is_gregorian {
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
    } else {
        year % 4 == 0
    }
}

fn days_in_month(year: i32, month: u32, day: u32) -> Result<u32> {
    if year == 1582 && month == 10 && (5..=14).contains(&day) {
        return Err(Error::invalid_datetime(
            "dates 1582-10-05 through 1582-10-14 do not exist in the Gregorian calendar",
        ));
    }

    let is_gregorian = is_gregorian_date(year, month, day);
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year, is_gregorian) {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month already validated"),
    };
    Ok(days)
}

/// One polynomial segment of the ΔT fit: applies to years below `until`,
/// evaluated at u = (year − pivot) / scale.
struct DeltaTSegment {
    until: f64,
    pivot: f64,
    scale: f64,
    coeffs: &'static [f64],
}

/// Espenak & Meeus (2014) polynomial fits, one segment per historical period.
const DELTA_T_SEGMENTS: &[DeltaTSegment] = &[
    DeltaTSegment {
        until: -500.0,
        pivot: 1820.0,
        scale: 100.0,
        coeffs: &[-20.0, 0.0, 32.0],
    },
    DeltaTSegment {
        until: 500.0,
        pivot: 0.0,
        scale: 100.0,
        coeffs: &[
            10583.6,
            -1014.41,
            33.78311,
            -5.952053,
            -0.1798452,
            0.022174192,
            0.0090316521,
        ],
    },
    DeltaTSegment {
        until: 1600.0,
        pivot: 1000.0,
        scale: 100.0,
        coeffs: &[
            1574.2,
            -556.01,
            71.23472,
            0.319781,
            -0.8503463,
            -0.005050998,
            0.0083572073,
        ],
    },
    DeltaTSegment {
        until: 1700.0,
        pivot: 1600.0,
        scale: 1.0,
        coeffs: &[120.0, -0.9808, -0.01532, 1.0 / 7129.0],
    },
    DeltaTSegment {
        until: 1800.0,
        pivot: 1700.0,
        scale: 1.0,
        coeffs: &[8.83, 0.1603, -0.0059285, 0.00013336, -1.0 / 1_174_000.0],
    },
    DeltaTSegment {
        until: 1860.0,
        pivot: 1800.0,
        scale: 1.0,
        coeffs: &[
            13.72,
            -0.332447,
            0.0068612,
            0.0041116,
            -0.00037436,
            0.0000121272,
            -0.0000001699,
            0.000000000875,
        ],
    },
    DeltaTSegment {
        until: 1900.0,
        pivot: 1860.0,
        scale: 1.0,
        coeffs: &[
            7.62,
            0.5737,
            -0.251754,
            0.01680668,
            -0.0004473624,
            1.0 / 233_174.0,
        ],
    },
    DeltaTSegment {
        until: 1920.0,
        pivot: 1900.0,
        scale: 1.0,
        coeffs: &[-2.79, 1.494119, -0.0598939, 0.0061966, -0.000197],
    },
    DeltaTSegment {
        until: 1941.0,
        pivot: 1920.0,
        scale: 1.0,
        coeffs: &[21.20, 0.84493, -0.076100, 0.0020936],
    },
    DeltaTSegment {
        until: 1961.0,
        pivot: 1950.0,
        scale: 1.0,
        coeffs: &[29.07, 0.407, -1.0 / 233.0, 1.0 / 2547.0],
    },
    DeltaTSegment {
        until: 1986.0,
        pivot: 1975.0,
        scale: 1.0,
        coeffs: &[45.45, 1.067, -1.0 / 260.0, -1.0 / 718.0],
    },
    DeltaTSegment {
        until: 2005.0,
        pivot: 2000.0,
        scale: 1.0,
        coeffs: &[
            63.86,
            0.3345,
            -0.060374,
            0.0017275,
            0.000651814,
            0.00002373599,
        ],
    },
    DeltaTSegment {
        until: 2015.0,
        pivot: 2005.0,
        scale: 1.0,
        coeffs: &[64.69, 0.2930],
    },
    DeltaTSegment {
        until: 3000.0,
        pivot: 2015.0,
        scale: 1.0,
        coeffs: &[67.62, 0.3645, 0.0039755],
    },
];

/// ΔT (TT − UT1) estimation for callers without a measured value.
pub struct DeltaT;

impl DeltaT {
    /// Estimates ΔT in seconds for a decimal year.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` for non-finite years or years beyond 3000.
    ///
    /// # Example
    /// ```
    /// # use sunpath::time::DeltaT;
    /// let delta_t = DeltaT::estimate(2024.0).unwrap();
    /// assert!(delta_t > 60.0 && delta_t < 80.0);
    /// ```
    pub fn estimate(decimal_year: f64) -> Result<f64> {
        if !decimal_year.is_finite() {
            return Err(Error::invalid_datetime("year must be finite"));
        }
        if decimal_year > 3000.0 {
            return Err(Error::invalid_datetime(
                "ΔT estimates not available beyond year 3000",
            ));
        }

        let segment = DELTA_T_SEGMENTS
            .iter()
            .find(|s| decimal_year < s.until)
            .unwrap_or(DELTA_T_SEGMENTS.last().expect("segment table is not empty"));
        let u = (decimal_year - segment.pivot) / segment.scale;
        Ok(polynomial(segment.coeffs, u))
    }

    /// Estimates ΔT from a year and month, at mid-month resolution.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` for months outside 1..12.
    pub fn estimate_from_date(year: i32, month: u32) -> Result<f64> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_datetime("month must be between 1 and 12"));
        }

        let decimal_year = f64::from(year) + (f64::from(month) - 0.5) / 12.0;
        Self::estimate(decimal_year)
    }

    /// Estimates ΔT from any chrono date-like value.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` if the estimate is unavailable for the date.
    #[cfg(feature = "chrono")]
    #[allow(clippy::needless_pass_by_value)]
    pub fn estimate_from_date_like<D: Datelike>(date: D) -> Result<f64> {
        Self::estimate_from_date(date.year(), date.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> CalendarTime {
        CalendarTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            utc_offset: 0.0,
        }
    }

    #[test]
    fn test_j2000_epoch() {
        let jd =
            JulianDate::from_calendar(&utc(2000, 1, 1, 12, 0, 0.0), &TimeDeltas::default()).unwrap();
        assert!((jd.julian_date() - J2000_JDN).abs() < EPSILON);
        assert!(jd.julian_century().abs() < EPSILON);
        assert!(jd.julian_ephemeris_millennium().abs() < EPSILON);
    }

    #[test]
    fn test_known_epochs() {
        let unix_epoch =
            JulianDate::from_calendar(&utc(1970, 1, 1, 0, 0, 0.0), &TimeDeltas::default()).unwrap();
        assert!((unix_epoch.julian_date() - 2_440_587.5).abs() < 1e-6);

        let y2k =
            JulianDate::from_calendar(&utc(2000, 1, 1, 0, 0, 0.0), &TimeDeltas::default()).unwrap();
        assert!((y2k.julian_date() - 2_451_544.5).abs() < 1e-6);
    }

    #[test]
    fn test_utc_offset_shifts_the_instant() {
        // 12:30:30 at UTC-7 is 19:30:30 UTC.
        let mut local = utc(2003, 10, 17, 12, 30, 30.0);
        local.utc_offset = -7.0;
        let from_local = JulianDate::from_calendar(&local, &TimeDeltas::default()).unwrap();
        let from_utc =
            JulianDate::from_calendar(&utc(2003, 10, 17, 19, 30, 30.0), &TimeDeltas::default())
                .unwrap();

        assert!((from_local.julian_date() - from_utc.julian_date()).abs() < EPSILON);
        assert!((from_local.julian_date() - 2_452_930.312_847).abs() < 1e-6);
    }

    #[test]
    fn test_delta_ut1_shifts_seconds() {
        let deltas = TimeDeltas::new(0.5, 0.0).unwrap();
        let nudged = JulianDate::from_calendar(&utc(2023, 6, 21, 12, 0, 0.0), &deltas).unwrap();
        let base =
            JulianDate::from_calendar(&utc(2023, 6, 21, 12, 0, 0.5), &TimeDeltas::default())
                .unwrap();
        assert!((nudged.julian_date() - base.julian_date()).abs() < EPSILON);
    }

    #[test]
    fn test_ephemeris_day_applies_delta_t() {
        let deltas = TimeDeltas::new(0.0, 67.0).unwrap();
        let jd = JulianDate::from_calendar(&utc(2003, 10, 17, 19, 30, 30.0), &deltas).unwrap();
        let expected = jd.julian_date() + 67.0 / SECONDS_PER_DAY;
        assert!((jd.julian_ephemeris_day() - expected).abs() < EPSILON);
    }

    #[test]
    fn test_field_validation() {
        let deltas = TimeDeltas::default();
        assert!(JulianDate::from_calendar(&utc(2024, 13, 1, 0, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 1, 0, 0, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 1, 32, 0, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 1, 1, 24, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 1, 1, 0, 60, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 1, 1, 0, 0, 60.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 2, 30, 0, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(2024, 2, 29, 0, 0, 0.0), &deltas).is_ok());
        assert!(JulianDate::from_calendar(&utc(1900, 2, 29, 0, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(1500, 2, 29, 0, 0, 0.0), &deltas).is_ok());
    }

    #[test]
    fn test_validated_year_range() {
        let deltas = TimeDeltas::default();
        assert!(JulianDate::from_calendar(&utc(-2000, 1, 1, 0, 0, 0.0), &deltas).is_ok());
        assert!(JulianDate::from_calendar(&utc(6000, 12, 31, 0, 0, 0.0), &deltas).is_ok());
        assert!(JulianDate::from_calendar(&utc(-2001, 12, 31, 0, 0, 0.0), &deltas).is_err());
        assert!(JulianDate::from_calendar(&utc(6001, 1, 1, 0, 0, 0.0), &deltas).is_err());
    }

    #[test]
    fn test_gregorian_gap() {
        let deltas = TimeDeltas::default();
        assert!(JulianDate::from_calendar(&utc(1582, 10, 10, 0, 0, 0.0), &deltas).is_err());
        let before = JulianDate::from_calendar(&utc(1582, 10, 4, 12, 0, 0.0), &deltas).unwrap();
        let after = JulianDate::from_calendar(&utc(1582, 10, 15, 12, 0, 0.0), &deltas).unwrap();

        // The dropped 10 calendar days collapse to a single Julian day.
        assert!((after.julian_date() - before.julian_date() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_calendar_round_trip() {
        let cases = [
            utc(2003, 10, 17, 19, 30, 30.0),
            utc(2024, 2, 29, 23, 59, 59.5),
            utc(1582, 10, 15, 0, 0, 0.0),
            utc(-1999, 7, 1, 6, 45, 12.25),
        ];
        for original in cases {
            let jd = JulianDate::from_calendar(&original, &TimeDeltas::default()).unwrap();
            let recovered = jd.to_utc_calendar();
            assert_eq!(recovered.year, original.year);
            assert_eq!(recovered.month, original.month);
            assert_eq!(recovered.day, original.day);
            assert_eq!(recovered.hour, original.hour);
            assert_eq!(recovered.minute, original.minute);
            assert!((recovered.second - original.second).abs() < 1e-4);
        }
    }

    #[test]
    fn test_delta_t_modern_estimates() {
        let delta_t_2000 = DeltaT::estimate(2000.0).unwrap();
        let delta_t_2020 = DeltaT::estimate(2020.0).unwrap();

        assert!(delta_t_2000 > 60.0 && delta_t_2000 < 70.0);
        assert!(delta_t_2020 > 65.0 && delta_t_2020 < 75.0);
        assert!(delta_t_2020 > delta_t_2000);
    }

    #[test]
    fn test_delta_t_historical_estimates() {
        assert!(DeltaT::estimate(1900.0).unwrap() < 0.0);
        let mid_century = DeltaT::estimate(1950.0).unwrap();
        assert!(mid_century > 25.0 && mid_century < 35.0);
    }

    #[test]
    fn test_delta_t_boundaries() {
        assert!(DeltaT::estimate(-500.0).is_ok());
        assert!(DeltaT::estimate(-2500.0).is_ok());
        assert!(DeltaT::estimate(3000.0).is_ok());
        assert!(DeltaT::estimate(3001.0).is_err());
        assert!(DeltaT::estimate(f64::NAN).is_err());
    }

    #[test]
    fn test_delta_t_from_date() {
        let from_date = DeltaT::estimate_from_date(2024, 6).unwrap();
        let from_decimal = DeltaT::estimate(2024.0 + 5.5 / 12.0).unwrap();
        assert!((from_date - from_decimal).abs() < 1e-9);

        assert!(DeltaT::estimate_from_date(2024, 0).is_err());
        assert!(DeltaT::estimate_from_date(2024, 13).is_err());
    }

    #[test]
    #[cfg(feature = "chrono")]
    fn test_delta_t_from_date_like() {
        use chrono::NaiveDate;

        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let from_chrono = DeltaT::estimate_from_date_like(date).unwrap();
        assert_eq!(from_chrono, DeltaT::estimate_from_date(2024, 6).unwrap());
    }
}
