//! # sunpath
//!
//! High-accuracy apparent sun position for a calendar instant and observer.

#![cfg_attr(not(feature = "std"), no_std)]
//!
//! Implements the NREL Solar Position Algorithm (Reda & Andreas 2003) as a
//! single, stateless reduction: calendar time plus time corrections and an
//! observer environment in, topocentric angles and day events out. Accuracy
//! is ±0.0003° over the years -2000 to 6000.
//!
//! Outputs per evaluation, selected by [`CalculationMode`]:
//! - topocentric **zenith** and **azimuth** (always)
//! - **incidence angle** on an arbitrarily tilted surface
//! - **equation of time** and **sunrise / transit / sunset** as local clock
//!   hours, with polar day/night reported as distinct variants
//!
//! The crate performs no I/O, keeps no state between calls and is safe to
//! use from any number of threads. It suits embedded controllers (the
//! `libm` feature gives a `no_std` build), solar trackers and energy models.
//!
//! ## Feature Flags
//!
//! - `std` (default): native math intrinsics
//! - `chrono` (default): `DateTime<Tz>` convenience constructors
//! - `libm`: pure-Rust math for `no_std` environments
//!
//! ## Quick Start
//!
//! ```rust
//! use sunpath::{spa, CalculationMode, CalendarTime, Environment, TimeDeltas};
//!
//! // NREL reference case: Golden, Colorado, 2003-10-17 12:30:30 local (UTC-7).
//! let time = CalendarTime::new(2003, 10, 17, 12, 30, 30.0, -7.0);
//! let deltas = TimeDeltas::new(0.0, 67.0)?;
//! let env = Environment {
//!     elevation: 1830.14,
//!     pressure: 820.0,
//!     temperature: 11.0,
//!     ..Environment::new(39.742476, -105.1786)
//! };
//!
//! let output = spa::calculate(&time, &deltas, &env, CalculationMode::All)?;
//! assert!((output.zenith - 50.11162).abs() < 1e-4);
//! assert!((output.azimuth - 194.34024).abs() < 1e-4);
//!
//! if let Some(events) = &output.day_events {
//!     if let Some(sunrise) = events.sunrise() {
//!         let (h, m, s) = sunrise.hms();
//!         println!("sunrise {h:02}:{m:02}:{s:02.0} local");
//!     }
//! }
//! # Ok::<(), sunpath::Error>(())
//! ```
//!
//! ## Coordinate Conventions
//!
//! - Azimuth: 0° = north, clockwise, [0°, 360°)
//! - Zenith angle: 0° = overhead, 90° = horizon, [0°, 180°]
//! - Surface azimuth rotation: measured from south, west positive
//!
//! ## Reference
//!
//! Reda, I.; Andreas, A. (2003). Solar position algorithm for solar
//! radiation applications. Solar Energy, 76(5), 577-589.
//! DOI: <http://dx.doi.org/10.1016/j.solener.2003.12.003>

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo, clippy::all)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cargo_common_metadata,
    clippy::multiple_crate_versions, // Acceptable for dev-dependencies
    clippy::float_cmp, // Exact comparisons of mathematical constants in tests
)]

pub use crate::error::{Error, Result};
pub use crate::spa::Intermediate;
pub use crate::types::{
    CalculationMode, CalendarTime, Environment, LocalHours, SolarOutput, SunriseResult, TimeDeltas,
};

// The reduction pipeline.
pub mod spa;

// Core modules
pub mod error;
pub mod types;

// Internal modules
mod math;

// Public modules
pub mod time;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_evaluations_are_bit_identical() {
        let time = CalendarTime::new(2024, 6, 21, 12, 0, 0.0, 2.0);
        let deltas = TimeDeltas::new(0.1, 69.0).unwrap();
        let env = Environment {
            elevation: 190.0,
            slope: 20.0,
            azimuth_rotation: 5.0,
            ..Environment::new(48.21, 16.37)
        };

        let first = spa::calculate(&time, &deltas, &env, CalculationMode::All).unwrap();
        let second = spa::calculate(&time, &deltas, &env, CalculationMode::All).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    #[cfg(feature = "chrono")]
    fn test_chrono_entry_point_matches_calendar_fields() {
        use chrono::{DateTime, FixedOffset};

        let datetime = "2024-06-21T12:00:00+02:00"
            .parse::<DateTime<FixedOffset>>()
            .unwrap();
        let deltas = TimeDeltas::new(0.0, 69.0).unwrap();
        let env = Environment::new(48.21, 16.37);

        let via_chrono =
            spa::calculate_at(datetime, &deltas, &env, CalculationMode::ZenithAzimuth).unwrap();
        let via_fields = spa::calculate(
            &CalendarTime::new(2024, 6, 21, 12, 0, 0.0, 2.0),
            &deltas,
            &env,
            CalculationMode::ZenithAzimuth,
        )
        .unwrap();

        assert!((via_chrono.zenith - via_fields.zenith).abs() < 1e-12);
        assert!((via_chrono.azimuth - via_fields.azimuth).abs() < 1e-12);
    }
}
