//! Input and output data holders.
//!
//! These are deliberately thin: immutable snapshots the pipeline reads from
//! and a result record it writes into, created fresh for every evaluation.
//! Range validation happens once at the pipeline entry, not in constructors,
//! so the holders stay plain data.

use crate::error::{check_delta_t, check_delta_ut1};
use crate::math::floor;
use crate::time::DeltaT;
use crate::Result;

/// A calendar instant with its UTC offset.
///
/// Must resolve to a valid Gregorian calendar date/time; the ten days removed
/// in October 1582 are rejected at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarTime {
    /// Calendar year (astronomical numbering, -2000..6000).
    pub year: i32,
    /// Month of year, 1..12.
    pub month: u32,
    /// Day of month, 1..31.
    pub day: u32,
    /// Hour of day, 0..23.
    pub hour: u32,
    /// Minute of hour, 0..59.
    pub minute: u32,
    /// Second of minute, fractional, 0..60.
    pub second: f64,
    /// Observer UTC offset in hours (east positive), ±18.
    pub utc_offset: f64,
}

impl CalendarTime {
    /// Creates a calendar instant from its components.
    #[must_use]
    pub const fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
        utc_offset: f64,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            utc_offset,
        }
    }

    /// Captures a chrono datetime together with its timezone offset.
    ///
    /// Sub-second precision is preserved in the fractional seconds.
    #[cfg(feature = "chrono")]
    pub fn from_datetime<Tz: chrono::TimeZone>(datetime: &chrono::DateTime<Tz>) -> Self {
        use chrono::{Datelike, Offset, Timelike};

        let offset_hours = f64::from(datetime.offset().fix().local_minus_utc()) / 3600.0;
        let local = datetime.naive_local();
        Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
            minute: local.minute(),
            second: f64::from(local.second()) + f64::from(local.nanosecond()) / 1e9,
            utc_offset: offset_hours,
        }
    }
}

/// Time-scale corrections, applied once during the time reduction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeDeltas {
    /// UT1 − UTC in seconds, strictly within ±1.
    pub delta_ut1: f64,
    /// TT − UT1 in seconds, within ±8000.
    pub delta_t: f64,
}

impl TimeDeltas {
    /// Creates validated time corrections.
    ///
    /// # Errors
    /// Returns `InvalidDeltaUt1` or `InvalidDeltaT` for out-of-range values.
    pub fn new(delta_ut1: f64, delta_t: f64) -> Result<Self> {
        check_delta_ut1(delta_ut1)?;
        check_delta_t(delta_t)?;
        Ok(Self {
            delta_ut1,
            delta_t,
        })
    }

    /// Corrections with ΔUT1 = 0 and an estimated ΔT for the given month.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` when no ΔT estimate exists for the date.
    pub fn estimated(year: i32, month: u32) -> Result<Self> {
        Ok(Self {
            delta_ut1: 0.0,
            delta_t: DeltaT::estimate_from_date(year, month)?,
        })
    }
}

/// Observer location, atmosphere and receiving surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Observer latitude in degrees, -90..+90 (north positive).
    pub latitude: f64,
    /// Observer longitude in degrees, -180..+180 (east positive).
    pub longitude: f64,
    /// Observer elevation in meters above sea level.
    pub elevation: f64,
    /// Annual-average local pressure in millibars.
    pub pressure: f64,
    /// Annual-average local temperature in degrees Celsius.
    pub temperature: f64,
    /// Surface slope from horizontal in degrees, 0..180.
    pub slope: f64,
    /// Surface azimuth rotation in degrees from south (west positive), ±180.
    pub azimuth_rotation: f64,
    /// Atmospheric refraction at sunrise/sunset in degrees (typically 0.5667).
    pub atmospheric_refraction: f64,
}

impl Environment {
    /// Standard sea-level refraction at sunrise/sunset in degrees.
    pub const STANDARD_REFRACTION: f64 = 0.5667;

    /// Observer at the given coordinates with standard-atmosphere defaults:
    /// sea level, 1013.25 mbar, 15 °C, horizontal surface.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: 0.0,
            pressure: 1013.25,
            temperature: 15.0,
            slope: 0.0,
            azimuth_rotation: 0.0,
            atmospheric_refraction: Self::STANDARD_REFRACTION,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Selects which output subset the evaluation produces.
///
/// The dispatcher consults this once; it prunes work only, never changes the
/// shared zenith/azimuth values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalculationMode {
    /// Topocentric zenith and azimuth only.
    ZenithAzimuth,
    /// Zenith, azimuth and the surface incidence angle.
    ZenithAzimuthIncidence,
    /// Zenith, azimuth, equation of time and sunrise/transit/sunset.
    ZenithAzimuthRiseTransitSet,
    /// Every output field.
    All,
}

impl CalculationMode {
    /// Whether the surface incidence angle is requested.
    #[must_use]
    pub const fn includes_incidence(self) -> bool {
        matches!(self, Self::ZenithAzimuthIncidence | Self::All)
    }

    /// Whether the equation of time and day events are requested.
    #[must_use]
    pub const fn includes_rise_transit_set(self) -> bool {
        matches!(self, Self::ZenithAzimuthRiseTransitSet | Self::All)
    }
}

/// Fractional local clock hours within a day, 0..24.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHours(f64);

impl LocalHours {
    /// Wraps a fractional hour-of-day value.
    #[must_use]
    pub const fn from_hours(hours: f64) -> Self {
        Self(hours)
    }

    /// Gets the fractional hours since local midnight.
    #[must_use]
    pub const fn hours(&self) -> f64 {
        self.0
    }

    /// Splits into whole hours, whole minutes and fractional seconds.
    ///
    /// # Example
    /// ```
    /// # use sunpath::types::LocalHours;
    /// let (h, m, s) = LocalHours::from_hours(6.212).hms();
    /// assert_eq!((h, m), (6, 12));
    /// assert!((s - 43.2).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn hms(&self) -> (u32, u32, f64) {
        let hour = floor(self.0);
        let minutes = (self.0 - hour) * 60.0;
        let minute = floor(minutes);
        let second = (minutes - minute) * 60.0;
        (hour as u32, minute as u32, second)
    }
}

/// Day events for a calendar date.
///
/// At extreme latitudes the sun may not cross the configured horizon at all;
/// those days are distinct variants, not errors, and still carry the transit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SunriseResult<T> {
    /// Regular day with sunrise, transit (solar noon) and sunset.
    RegularDay {
        /// Time of sunrise.
        sunrise: T,
        /// Time of solar transit.
        transit: T,
        /// Time of sunset.
        sunset: T,
    },
    /// Polar day: the sun stays above the horizon.
    AllDay {
        /// Time of solar transit (closest approach to the zenith).
        transit: T,
    },
    /// Polar night: the sun stays below the horizon.
    AllNight {
        /// Time of solar transit (highest point, still below the horizon).
        transit: T,
    },
}

impl<T> SunriseResult<T> {
    /// Gets the transit time for any variant.
    pub const fn transit(&self) -> &T {
        match self {
            Self::RegularDay { transit, .. }
            | Self::AllDay { transit }
            | Self::AllNight { transit } => transit,
        }
    }

    /// Whether this is a regular day with sunrise and sunset.
    pub const fn is_regular_day(&self) -> bool {
        matches!(self, Self::RegularDay { .. })
    }

    /// Whether this is a polar day (sun never sets).
    pub const fn is_polar_day(&self) -> bool {
        matches!(self, Self::AllDay { .. })
    }

    /// Whether this is a polar night (sun never rises).
    pub const fn is_polar_night(&self) -> bool {
        matches!(self, Self::AllNight { .. })
    }

    /// Gets the sunrise time on a regular day.
    pub const fn sunrise(&self) -> Option<&T> {
        if let Self::RegularDay { sunrise, .. } = self {
            Some(sunrise)
        } else {
            None
        }
    }

    /// Gets the sunset time on a regular day.
    pub const fn sunset(&self) -> Option<&T> {
        if let Self::RegularDay { sunset, .. } = self {
            Some(sunset)
        } else {
            None
        }
    }
}

/// Final outputs of one evaluation.
///
/// Fields beyond zenith/azimuth are populated according to the requested
/// [`CalculationMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolarOutput {
    /// Topocentric zenith angle in degrees, 0..180.
    pub zenith: f64,
    /// Topocentric azimuth in degrees from north, clockwise, 0..360.
    pub azimuth: f64,
    /// Astronomers' azimuth in degrees from south (west positive), 0..360.
    pub azimuth_astro: f64,
    /// Incidence angle on the tilted surface in degrees, when requested.
    pub incidence: Option<f64>,
    /// Equation of time in minutes, when day events are requested.
    pub equation_of_time: Option<f64>,
    /// Sunrise/transit/sunset in fractional local hours, when requested.
    pub day_events: Option<SunriseResult<LocalHours>>,
    /// Sun altitude at transit in degrees, regular days only.
    pub transit_altitude: Option<f64>,
    /// Topocentric hour angle at sunrise in degrees, regular days only.
    pub sunrise_hour_angle: Option<f64>,
    /// Topocentric hour angle at sunset in degrees, regular days only.
    pub sunset_hour_angle: Option<f64>,
}

impl SolarOutput {
    /// Topocentric elevation angle in degrees (90° − zenith).
    #[must_use]
    pub fn elevation_angle(&self) -> f64 {
        90.0 - self.zenith
    }

    /// Whether the sun is above the horizon.
    #[must_use]
    pub fn is_sun_up(&self) -> bool {
        self.elevation_angle() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_predicates() {
        assert!(!CalculationMode::ZenithAzimuth.includes_incidence());
        assert!(!CalculationMode::ZenithAzimuth.includes_rise_transit_set());
        assert!(CalculationMode::ZenithAzimuthIncidence.includes_incidence());
        assert!(!CalculationMode::ZenithAzimuthIncidence.includes_rise_transit_set());
        assert!(!CalculationMode::ZenithAzimuthRiseTransitSet.includes_incidence());
        assert!(CalculationMode::ZenithAzimuthRiseTransitSet.includes_rise_transit_set());
        assert!(CalculationMode::All.includes_incidence());
        assert!(CalculationMode::All.includes_rise_transit_set());
    }

    #[test]
    fn test_time_deltas_validation() {
        assert!(TimeDeltas::new(0.0, 67.0).is_ok());
        assert!(TimeDeltas::new(1.0, 67.0).is_err());
        assert!(TimeDeltas::new(0.0, 9000.0).is_err());

        let estimated = TimeDeltas::estimated(2024, 6).unwrap();
        assert_eq!(estimated.delta_ut1, 0.0);
        assert!(estimated.delta_t > 60.0 && estimated.delta_t < 80.0);
    }

    #[test]
    fn test_environment_defaults() {
        let env = Environment::new(39.742476, -105.1786);
        assert_eq!(env.elevation, 0.0);
        assert_eq!(env.pressure, 1013.25);
        assert_eq!(env.temperature, 15.0);
        assert_eq!(env.slope, 0.0);
        assert_eq!(env.atmospheric_refraction, Environment::STANDARD_REFRACTION);
    }

    #[test]
    fn test_local_hours_hms() {
        let (h, m, s) = LocalHours::from_hours(17.338656).hms();
        assert_eq!(h, 17);
        assert_eq!(m, 20);
        assert!((s - 19.16).abs() < 0.01);

        let (h, m, s) = LocalHours::from_hours(0.0).hms();
        assert_eq!((h, m), (0, 0));
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_sunrise_result_accessors() {
        let regular = SunriseResult::RegularDay {
            sunrise: LocalHours::from_hours(6.2),
            transit: LocalHours::from_hours(11.8),
            sunset: LocalHours::from_hours(17.3),
        };
        assert!(regular.is_regular_day());
        assert!(!regular.is_polar_day());
        assert!((regular.transit().hours() - 11.8).abs() < 1e-12);
        assert!(regular.sunrise().is_some());
        assert!(regular.sunset().is_some());

        let polar_day = SunriseResult::AllDay {
            transit: LocalHours::from_hours(12.0),
        };
        assert!(polar_day.is_polar_day());
        assert!(polar_day.sunrise().is_none());

        let polar_night = SunriseResult::AllNight {
            transit: LocalHours::from_hours(12.0),
        };
        assert!(polar_night.is_polar_night());
        assert!(polar_night.sunset().is_none());
    }

    #[test]
    #[cfg(feature = "chrono")]
    fn test_calendar_time_from_datetime() {
        use chrono::{DateTime, FixedOffset};

        let datetime = "2003-10-17T12:30:30-07:00"
            .parse::<DateTime<FixedOffset>>()
            .unwrap();
        let time = CalendarTime::from_datetime(&datetime);
        assert_eq!(time.year, 2003);
        assert_eq!(time.month, 10);
        assert_eq!(time.day, 17);
        assert_eq!(time.hour, 12);
        assert_eq!(time.minute, 30);
        assert!((time.second - 30.0).abs() < 1e-9);
        assert!((time.utc_offset - -7.0).abs() < 1e-9);
    }
}
