//! Error types and input validation.
//!
//! Every range documented in the crate-level contract is enforced here, once,
//! before any pipeline stage runs. Non-finite inputs fail their range checks.

use crate::math::normalize_degrees_0_to_360;
use core::fmt;

/// Result type alias for operations in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur during a sun position evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Latitude outside -90..+90 degrees.
    InvalidLatitude {
        /// The offending value.
        value: f64,
    },
    /// Longitude outside -180..+180 degrees.
    InvalidLongitude {
        /// The offending value.
        value: f64,
    },
    /// Observer elevation below the supported minimum.
    InvalidElevation {
        /// The offending value in meters.
        value: f64,
    },
    /// Pressure outside 0..5000 millibars.
    InvalidPressure {
        /// The offending value in millibars.
        value: f64,
    },
    /// Temperature outside -273..6000 degrees Celsius.
    InvalidTemperature {
        /// The offending value in degrees Celsius.
        value: f64,
    },
    /// Surface slope outside 0..180 degrees.
    InvalidSlope {
        /// The offending value.
        value: f64,
    },
    /// Surface azimuth rotation outside -180..+180 degrees.
    InvalidAzimuthRotation {
        /// The offending value.
        value: f64,
    },
    /// Sunrise refraction constant outside ±5 degrees.
    InvalidAtmosphericRefraction {
        /// The offending value.
        value: f64,
    },
    /// UTC offset outside ±18 hours.
    InvalidUtcOffset {
        /// The offending value in hours.
        value: f64,
    },
    /// ΔUT1 outside the open interval -1..+1 seconds.
    InvalidDeltaUt1 {
        /// The offending value in seconds.
        value: f64,
    },
    /// ΔT outside ±8000 seconds.
    InvalidDeltaT {
        /// The offending value in seconds.
        value: f64,
    },
    /// Calendar instant invalid or outside the algorithm's validated range.
    InvalidDateTime {
        /// Description of the constraint violation.
        message: &'static str,
    },
    /// A final output failed its finiteness/range guard.
    ComputationError {
        /// Description of the computation error.
        message: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLatitude { value } => {
                write!(
                    f,
                    "invalid latitude {value}° (must be between -90° and +90°)"
                )
            }
            Self::InvalidLongitude { value } => {
                write!(
                    f,
                    "invalid longitude {value}° (must be between -180° and +180°)"
                )
            }
            Self::InvalidElevation { value } => {
                write!(
                    f,
                    "invalid elevation {value} m (must be at least {MIN_ELEVATION_METERS} m)"
                )
            }
            Self::InvalidPressure { value } => {
                write!(
                    f,
                    "invalid pressure {value} mbar (must be in 0..5000, exclusive bottom)"
                )
            }
            Self::InvalidTemperature { value } => {
                write!(
                    f,
                    "invalid temperature {value}°C (must be between -273°C and 6000°C)"
                )
            }
            Self::InvalidSlope { value } => {
                write!(f, "invalid surface slope {value}° (must be 0°..180°)")
            }
            Self::InvalidAzimuthRotation { value } => {
                write!(
                    f,
                    "invalid surface azimuth rotation {value}° (must be -180°..+180°)"
                )
            }
            Self::InvalidAtmosphericRefraction { value } => {
                write!(
                    f,
                    "invalid sunrise refraction {value}° (magnitude must not exceed 5°)"
                )
            }
            Self::InvalidUtcOffset { value } => {
                write!(f, "invalid UTC offset {value} h (must be within ±18 h)")
            }
            Self::InvalidDeltaUt1 { value } => {
                write!(
                    f,
                    "invalid ΔUT1 {value} s (must be strictly between -1 s and +1 s)"
                )
            }
            Self::InvalidDeltaT { value } => {
                write!(f, "invalid ΔT {value} s (magnitude must not exceed 8000 s)")
            }
            Self::InvalidDateTime { message } => {
                write!(f, "invalid date/time: {message}")
            }
            Self::ComputationError { message } => {
                write!(f, "computation error: {message}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl Error {
    /// Creates an invalid date/time error.
    #[must_use]
    pub const fn invalid_datetime(message: &'static str) -> Self {
        Self::InvalidDateTime { message }
    }

    /// Creates a computation error.
    #[must_use]
    pub const fn computation_error(message: &'static str) -> Self {
        Self::ComputationError { message }
    }
}

/// Lowest supported observer elevation in meters.
const MIN_ELEVATION_METERS: f64 = -6_500_000.0;

/// Validates latitude is within -90..+90 degrees.
///
/// # Errors
/// Returns `InvalidLatitude` for out-of-range or non-finite values.
pub fn check_latitude(latitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::InvalidLatitude { value: latitude });
    }
    Ok(())
}

/// Validates longitude is within -180..+180 degrees.
///
/// # Errors
/// Returns `InvalidLongitude` for out-of-range or non-finite values.
pub fn check_longitude(longitude: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::InvalidLongitude { value: longitude });
    }
    Ok(())
}

/// Validates both observer coordinates.
///
/// # Errors
/// Returns `InvalidLatitude` or `InvalidLongitude` for out-of-range values.
pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    check_latitude(latitude)?;
    check_longitude(longitude)?;
    Ok(())
}

/// Validates observer elevation.
///
/// # Errors
/// Returns `InvalidElevation` below the supported minimum or for non-finite values.
pub fn check_elevation(elevation: f64) -> Result<()> {
    if !(elevation >= MIN_ELEVATION_METERS && elevation.is_finite()) {
        return Err(Error::InvalidElevation { value: elevation });
    }
    Ok(())
}

/// Validates annual-average local pressure.
///
/// # Errors
/// Returns `InvalidPressure` outside 0..5000 mbar or for non-finite values.
pub fn check_pressure(pressure: f64) -> Result<()> {
    if !(pressure > 0.0 && pressure <= 5000.0) {
        return Err(Error::InvalidPressure { value: pressure });
    }
    Ok(())
}

/// Validates annual-average local temperature.
///
/// # Errors
/// Returns `InvalidTemperature` outside -273..6000 °C or for non-finite values.
pub fn check_temperature(temperature: f64) -> Result<()> {
    if !(temperature > -273.0 && temperature <= 6000.0) {
        return Err(Error::InvalidTemperature { value: temperature });
    }
    Ok(())
}

/// Validates the surface slope for incidence-angle use.
///
/// # Errors
/// Returns `InvalidSlope` outside 0..180 degrees or for non-finite values.
pub fn check_slope(slope: f64) -> Result<()> {
    if !(0.0..=180.0).contains(&slope) {
        return Err(Error::InvalidSlope { value: slope });
    }
    Ok(())
}

/// Validates the surface azimuth rotation for incidence-angle use.
///
/// # Errors
/// Returns `InvalidAzimuthRotation` outside ±180 degrees or for non-finite values.
pub fn check_azimuth_rotation(rotation: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&rotation) {
        return Err(Error::InvalidAzimuthRotation { value: rotation });
    }
    Ok(())
}

/// Validates the atmospheric refraction constant used at sunrise/sunset.
///
/// # Errors
/// Returns `InvalidAtmosphericRefraction` beyond ±5 degrees or for non-finite values.
pub fn check_atmospheric_refraction(refraction: f64) -> Result<()> {
    if !(-5.0..=5.0).contains(&refraction) {
        return Err(Error::InvalidAtmosphericRefraction { value: refraction });
    }
    Ok(())
}

/// Validates the observer's UTC offset in hours.
///
/// # Errors
/// Returns `InvalidUtcOffset` beyond ±18 hours or for non-finite values.
pub fn check_utc_offset(offset_hours: f64) -> Result<()> {
    if !(-18.0..=18.0).contains(&offset_hours) {
        return Err(Error::InvalidUtcOffset {
            value: offset_hours,
        });
    }
    Ok(())
}

/// Validates ΔUT1 (UT1 − UTC).
///
/// # Errors
/// Returns `InvalidDeltaUt1` outside the open interval -1..+1 s or for non-finite values.
pub fn check_delta_ut1(delta_ut1: f64) -> Result<()> {
    if !(delta_ut1 > -1.0 && delta_ut1 < 1.0) {
        return Err(Error::InvalidDeltaUt1 { value: delta_ut1 });
    }
    Ok(())
}

/// Validates ΔT (TT − UT1).
///
/// # Errors
/// Returns `InvalidDeltaT` beyond ±8000 s or for non-finite values.
pub fn check_delta_t(delta_t: f64) -> Result<()> {
    if !(-8000.0..=8000.0).contains(&delta_t) {
        return Err(Error::InvalidDeltaT { value: delta_t });
    }
    Ok(())
}

/// Validates and normalizes an azimuth angle to [0, 360) degrees.
///
/// # Errors
/// Returns `ComputationError` if the azimuth is not finite.
pub fn check_azimuth(azimuth: f64) -> Result<f64> {
    if !azimuth.is_finite() {
        return Err(Error::computation_error("azimuth is not finite"));
    }
    Ok(normalize_degrees_0_to_360(azimuth))
}

/// Validates a zenith angle to be within [0, 180] degrees.
///
/// # Errors
/// Returns `ComputationError` if the zenith angle is not finite or out of range.
pub fn check_zenith_angle(zenith: f64) -> Result<f64> {
    if !zenith.is_finite() {
        return Err(Error::computation_error("zenith angle is not finite"));
    }
    if !(0.0..=180.0).contains(&zenith) {
        return Err(Error::computation_error(
            "zenith angle must be between 0° and 180°",
        ));
    }
    Ok(zenith)
}
