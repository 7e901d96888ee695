//! The sun-position reduction pipeline.
//!
//! Implements the NREL SPA reduction (Reda & Andreas 2003): a fixed chain of
//! stages from calendar time to topocentric angles, with an uncertainty of
//! ±0.0003° over the years -2000 to 6000.
//!
//! Data flows one way. The time reduction feeds the heliocentric series,
//! those feed the geocentric transform, and so on down to refraction and the
//! output synthesis; each stage reads only quantities produced by earlier
//! ones, collected in an [`Intermediate`] record owned by the current call.
//!
//! Reference: Reda, I.; Andreas, A. (2003). Solar position algorithm for
//! solar radiation applications. Solar Energy, 76(5), 577-589.
//! DOI: <http://dx.doi.org/10.1016/j.solener.2003.12.003>

#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::unreadable_literal)]

use crate::error::{
    check_atmospheric_refraction, check_azimuth, check_azimuth_rotation, check_coordinates,
    check_delta_t, check_delta_ut1, check_elevation, check_pressure, check_slope,
    check_temperature, check_utc_offset, check_zenith_angle,
};
use crate::math::{
    acos_clamped, asin_clamped, atan, atan2, cos, degrees_to_radians, floor, fold_minutes,
    fold_unit_interval, mul_add, normalize_degrees_0_to_360, normalize_degrees_pm180, polynomial,
    radians_to_degrees, sin, tan,
};
use crate::time::JulianDate;
use crate::types::{
    CalendarTime, CalculationMode, Environment, LocalHours, SolarOutput, SunriseResult, TimeDeltas,
};
use crate::Result;

mod coefficients;
use coefficients::{
    NUTATION_ARGUMENT_COEFFS, OBLIQUITY_COEFFS, SUN_MEAN_LONGITUDE_COEFFS, TERMS_B, TERMS_L,
    TERMS_PE, TERMS_R, TERMS_Y,
};

/// Apparent solar radius in degrees.
const SUN_RADIUS_DEGREES: f64 = 0.26667;

/// Aberration constant in arcseconds.
const ABERRATION_CONSTANT: f64 = -20.4898;

/// Equatorial horizontal parallax of the sun at 1 AU, arcseconds.
const PARALLAX_CONSTANT: f64 = 8.794;

/// Earth flattening factor.
const EARTH_FLATTENING_FACTOR: f64 = 0.99664719;

/// Earth equatorial radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_378_140.0;

/// Sidereal degrees swept per solar day.
const SIDEREAL_DEGREES_PER_DAY: f64 = 360.985647;

/// Arcseconds per degree.
const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Seconds per day.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Intermediate quantities of one evaluation.
///
/// A scratch record populated stage by stage and owned exclusively by the
/// invocation that produced it; returned for inspection by
/// [`calculate_with_intermediate`]. All angles are degrees unless noted.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct Intermediate {
    /// Julian Day (UT1).
    pub jd: f64,
    /// Julian Ephemeris Day.
    pub jde: f64,
    /// Julian Century since J2000.0.
    pub jc: f64,
    /// Julian Ephemeris Century.
    pub jce: f64,
    /// Julian Ephemeris Millennium.
    pub jme: f64,
    /// Earth heliocentric longitude L.
    pub l: f64,
    /// Earth heliocentric latitude B.
    pub b: f64,
    /// Earth radius vector R in astronomical units.
    pub r: f64,
    /// Geocentric longitude Θ.
    pub theta: f64,
    /// Geocentric latitude β.
    pub beta: f64,
    /// Fundamental nutation arguments X0..X4.
    pub x: [f64; 5],
    /// Nutation in longitude Δψ.
    pub delta_psi: f64,
    /// Nutation in obliquity Δε.
    pub delta_epsilon: f64,
    /// Mean obliquity of the ecliptic ε0, arcseconds.
    pub epsilon0: f64,
    /// True obliquity of the ecliptic ε.
    pub epsilon: f64,
    /// Aberration correction Δτ.
    pub delta_tau: f64,
    /// Apparent sun longitude λ.
    pub lambda: f64,
    /// Greenwich mean sidereal time ν0.
    pub nu0: f64,
    /// Greenwich apparent sidereal time ν.
    pub nu: f64,
    /// Geocentric sun right ascension α.
    pub alpha: f64,
    /// Geocentric sun declination δ.
    pub delta: f64,
    /// Observer local hour angle H.
    pub h: f64,
    /// Equatorial horizontal parallax of the sun ξ.
    pub xi: f64,
    /// Parallax in right ascension Δα.
    pub delta_alpha: f64,
    /// Topocentric right ascension α′.
    pub alpha_prime: f64,
    /// Topocentric declination δ′.
    pub delta_prime: f64,
    /// Topocentric local hour angle H′.
    pub h_prime: f64,
    /// Topocentric elevation angle without refraction e0.
    pub e0: f64,
    /// Atmospheric refraction correction Δe.
    pub delta_e: f64,
    /// Topocentric elevation angle e.
    pub e: f64,
}

/// Evaluates the sun position for one calendar instant and observer.
///
/// Runs the stages selected by `mode`; the zenith/azimuth pair is produced in
/// every mode and is identical regardless of which extra outputs are pruned.
///
/// # Errors
/// Returns a validation error when any input is outside its documented range;
/// the pipeline never starts on invalid inputs. Polar day/night is reported
/// through the [`SunriseResult`] variants, not as an error.
///
/// # Example
/// ```
/// use sunpath::{spa, CalculationMode, CalendarTime, Environment, TimeDeltas};
///
/// let time = CalendarTime::new(2003, 10, 17, 12, 30, 30.0, -7.0);
/// let deltas = TimeDeltas::new(0.0, 67.0).unwrap();
/// let mut env = Environment::new(39.742476, -105.1786);
/// env.elevation = 1830.14;
/// env.pressure = 820.0;
/// env.temperature = 11.0;
///
/// let output = spa::calculate(&time, &deltas, &env, CalculationMode::ZenithAzimuth).unwrap();
/// assert!((output.zenith - 50.11162).abs() < 1e-4);
/// assert!((output.azimuth - 194.34024).abs() < 1e-4);
/// ```
pub fn calculate(
    time: &CalendarTime,
    deltas: &TimeDeltas,
    environment: &Environment,
    mode: CalculationMode,
) -> Result<SolarOutput> {
    calculate_with_intermediate(time, deltas, environment, mode).map(|(output, _)| output)
}

/// Evaluates the sun position and returns the intermediate record with it.
///
/// # Errors
/// Same contract as [`calculate`].
pub fn calculate_with_intermediate(
    time: &CalendarTime,
    deltas: &TimeDeltas,
    environment: &Environment,
    mode: CalculationMode,
) -> Result<(SolarOutput, Intermediate)> {
    validate_inputs(time, deltas, environment)?;

    let jd = JulianDate::from_calendar(time, deltas)?;
    let mut im = geocentric_stages(&jd);
    observer_stages(&mut im, environment);

    let azimuth_astro = topocentric_astronomers_azimuth(
        im.h_prime,
        im.delta_prime,
        environment.latitude,
    );
    let azimuth = check_azimuth(azimuth_astro + 180.0)?;
    let zenith = check_zenith_angle(90.0 - im.e)?;

    let incidence = mode
        .includes_incidence()
        .then(|| surface_incidence_angle(zenith, azimuth_astro, environment));

    let mut equation_of_time = None;
    let mut day_events = None;
    let mut transit_altitude = None;
    let mut sunrise_hour_angle = None;
    let mut sunset_hour_angle = None;
    if mode.includes_rise_transit_set() {
        equation_of_time = Some(equation_of_time_minutes(&im));
        let day = rise_transit_set(time, deltas, environment)?;
        transit_altitude = day.transit_altitude;
        sunrise_hour_angle = day.sunrise_hour_angle;
        sunset_hour_angle = day.sunset_hour_angle;
        day_events = Some(day.events);
    }

    let output = SolarOutput {
        zenith,
        azimuth,
        azimuth_astro,
        incidence,
        equation_of_time,
        day_events,
        transit_altitude,
        sunrise_hour_angle,
        sunset_hour_angle,
    };
    Ok((output, im))
}

/// Evaluates the sun position for a chrono datetime.
///
/// The timezone offset of `datetime` becomes the UTC offset of the calendar
/// instant, so day events come back in that local time.
///
/// # Errors
/// Same contract as [`calculate`].
#[cfg(feature = "chrono")]
#[allow(clippy::needless_pass_by_value)]
pub fn calculate_at<Tz: chrono::TimeZone>(
    datetime: chrono::DateTime<Tz>,
    deltas: &TimeDeltas,
    environment: &Environment,
    mode: CalculationMode,
) -> Result<SolarOutput> {
    let time = CalendarTime::from_datetime(&datetime);
    calculate(&time, deltas, environment, mode)
}

/// Validates every input field before any stage runs.
fn validate_inputs(
    time: &CalendarTime,
    deltas: &TimeDeltas,
    environment: &Environment,
) -> Result<()> {
    check_utc_offset(time.utc_offset)?;
    check_delta_ut1(deltas.delta_ut1)?;
    check_delta_t(deltas.delta_t)?;
    check_coordinates(environment.latitude, environment.longitude)?;
    check_elevation(environment.elevation)?;
    check_pressure(environment.pressure)?;
    check_temperature(environment.temperature)?;
    check_slope(environment.slope)?;
    check_azimuth_rotation(environment.azimuth_rotation)?;
    check_atmospheric_refraction(environment.atmospheric_refraction)?;
    Ok(())
}

// ============================================================================
// Heliocentric series evaluation
// ============================================================================

/// Sums one group of periodic terms: Σ A·cos(B + C·JME).
fn sum_periodic_terms(terms: &[coefficients::PeriodicTerm], jme: f64) -> f64 {
    let mut sum = 0.0;
    for term in terms {
        sum += term[0] * cos(mul_add(term[2], jme, term[1]));
    }
    sum
}

/// Combines the term-set sums as a polynomial in JME, scaled by 1e-8.
fn series_value(term_sets: &[&[coefficients::PeriodicTerm]], jme: f64) -> f64 {
    // The longest series has six sets; sums are collected in a fixed array
    // to keep the evaluation allocation-free.
    let mut sums = [0.0; 6];
    for (slot, terms) in sums.iter_mut().zip(term_sets) {
        *slot = sum_periodic_terms(terms, jme);
    }
    polynomial(&sums[..term_sets.len()], jme) / 1e8
}

/// Earth heliocentric longitude L in degrees, normalized to [0, 360).
fn heliocentric_longitude(jme: f64) -> f64 {
    normalize_degrees_0_to_360(radians_to_degrees(series_value(&TERMS_L, jme)))
}

/// Earth heliocentric latitude B in degrees.
fn heliocentric_latitude(jme: f64) -> f64 {
    radians_to_degrees(series_value(&TERMS_B, jme))
}

/// Earth radius vector R in astronomical units.
fn earth_radius_vector(jme: f64) -> f64 {
    series_value(&TERMS_R, jme)
}

// ============================================================================
// Nutation, obliquity, aberration
// ============================================================================

/// The five fundamental nutation arguments X0..X4 in degrees.
fn nutation_arguments(jce: f64) -> [f64; 5] {
    let mut x = [0.0; 5];
    for (slot, coeffs) in x.iter_mut().zip(&NUTATION_ARGUMENT_COEFFS) {
        *slot = polynomial(coeffs, jce);
    }
    x
}

/// Nutation in longitude Δψ and obliquity Δε, degrees.
fn nutation(jce: f64, x: &[f64; 5]) -> (f64, f64) {
    let mut delta_psi = 0.0;
    let mut delta_epsilon = 0.0;

    for (y_row, pe_row) in TERMS_Y.iter().zip(&TERMS_PE) {
        let mut argument = 0.0;
        for (&x_value, &y_value) in x.iter().zip(y_row) {
            argument += x_value * f64::from(y_value);
        }
        let argument = degrees_to_radians(argument);

        delta_psi += mul_add(pe_row[1], jce, pe_row[0]) * sin(argument);
        delta_epsilon += mul_add(pe_row[3], jce, pe_row[2]) * cos(argument);
    }

    (delta_psi / 36_000_000.0, delta_epsilon / 36_000_000.0)
}

/// Mean obliquity of the ecliptic in arcseconds.
fn mean_obliquity(jme: f64) -> f64 {
    polynomial(&OBLIQUITY_COEFFS, jme / 10.0)
}

/// Aberration correction Δτ in degrees.
fn aberration_correction(r: f64) -> f64 {
    ABERRATION_CONSTANT / (ARCSEC_PER_DEGREE * r)
}

// ============================================================================
// Geocentric transform and sidereal time
// ============================================================================

/// Greenwich mean sidereal time ν0 in degrees.
fn greenwich_mean_sidereal_time(jd: f64, jc: f64) -> f64 {
    normalize_degrees_0_to_360(
        mul_add(360.98564736629, jd - 2_451_545.0, 280.46061837)
            + jc * jc * mul_add(-jc, 1.0 / 38_710_000.0, 0.000387933),
    )
}

/// Geocentric sun right ascension α in degrees, [0, 360).
fn geocentric_right_ascension(lambda: f64, epsilon: f64, beta: f64) -> f64 {
    let lambda_rad = degrees_to_radians(lambda);
    let epsilon_rad = degrees_to_radians(epsilon);
    let alpha = atan2(
        mul_add(
            sin(lambda_rad),
            cos(epsilon_rad),
            -(tan(degrees_to_radians(beta)) * sin(epsilon_rad)),
        ),
        cos(lambda_rad),
    );
    normalize_degrees_0_to_360(radians_to_degrees(alpha))
}

/// Geocentric sun declination δ in degrees.
fn geocentric_declination(beta: f64, epsilon: f64, lambda: f64) -> f64 {
    let beta_rad = degrees_to_radians(beta);
    let epsilon_rad = degrees_to_radians(epsilon);
    radians_to_degrees(asin_clamped(mul_add(
        sin(beta_rad),
        cos(epsilon_rad),
        cos(beta_rad) * sin(epsilon_rad) * sin(degrees_to_radians(lambda)),
    )))
}

/// Runs the location-independent stages: time reduction through geocentric
/// right ascension/declination and apparent sidereal time.
fn geocentric_stages(jd: &JulianDate) -> Intermediate {
    let mut im = Intermediate {
        jd: jd.julian_date(),
        jde: jd.julian_ephemeris_day(),
        jc: jd.julian_century(),
        jce: jd.julian_ephemeris_century(),
        jme: jd.julian_ephemeris_millennium(),
        ..Intermediate::default()
    };

    im.l = heliocentric_longitude(im.jme);
    im.b = heliocentric_latitude(im.jme);
    im.r = earth_radius_vector(im.jme);

    im.theta = normalize_degrees_0_to_360(im.l + 180.0);
    im.beta = -im.b;

    im.x = nutation_arguments(im.jce);
    let (delta_psi, delta_epsilon) = nutation(im.jce, &im.x);
    im.delta_psi = delta_psi;
    im.delta_epsilon = delta_epsilon;

    im.epsilon0 = mean_obliquity(im.jme);
    im.epsilon = im.epsilon0 / ARCSEC_PER_DEGREE + im.delta_epsilon;

    im.delta_tau = aberration_correction(im.r);
    im.lambda = im.theta + im.delta_psi + im.delta_tau;

    im.nu0 = greenwich_mean_sidereal_time(im.jd, im.jc);
    im.nu = mul_add(
        im.delta_psi,
        cos(degrees_to_radians(im.epsilon)),
        im.nu0,
    );

    im.alpha = geocentric_right_ascension(im.lambda, im.epsilon, im.beta);
    im.delta = geocentric_declination(im.beta, im.epsilon, im.lambda);

    im
}

// ============================================================================
// Topocentric correction and refraction
// ============================================================================

/// Runs the observer-dependent stages: hour angle, parallax, refraction.
fn observer_stages(im: &mut Intermediate, environment: &Environment) {
    im.h = normalize_degrees_0_to_360(im.nu + environment.longitude - im.alpha);
    im.xi = PARALLAX_CONSTANT / (ARCSEC_PER_DEGREE * im.r);

    let phi = degrees_to_radians(environment.latitude);
    let xi_rad = degrees_to_radians(im.xi);
    let h_rad = degrees_to_radians(im.h);
    let delta_rad = degrees_to_radians(im.delta);

    // Observer position terms on the flattened Earth.
    let u = atan(EARTH_FLATTENING_FACTOR * tan(phi));
    let y = mul_add(
        EARTH_FLATTENING_FACTOR,
        sin(u),
        environment.elevation * sin(phi) / EARTH_RADIUS_METERS,
    );
    let x = cos(u) + environment.elevation * cos(phi) / EARTH_RADIUS_METERS;

    let delta_alpha_rad = atan2(
        -x * sin(xi_rad) * sin(h_rad),
        mul_add(-x * sin(xi_rad), cos(h_rad), cos(delta_rad)),
    );
    im.delta_alpha = radians_to_degrees(delta_alpha_rad);
    im.delta_prime = radians_to_degrees(atan2(
        mul_add(-y, sin(xi_rad), sin(delta_rad)) * cos(delta_alpha_rad),
        mul_add(-x * sin(xi_rad), cos(h_rad), cos(delta_rad)),
    ));
    im.alpha_prime = im.alpha + im.delta_alpha;
    im.h_prime = im.h - im.delta_alpha;

    im.e0 = topocentric_elevation_angle(environment.latitude, im.delta_prime, im.h_prime);
    im.delta_e = refraction_correction(environment, im.e0);
    im.e = im.e0 + im.delta_e;
}

/// Topocentric elevation angle without refraction, degrees.
fn topocentric_elevation_angle(latitude: f64, delta_prime: f64, h_prime: f64) -> f64 {
    let phi = degrees_to_radians(latitude);
    let delta_prime_rad = degrees_to_radians(delta_prime);
    radians_to_degrees(asin_clamped(mul_add(
        sin(phi),
        sin(delta_prime_rad),
        cos(phi) * cos(delta_prime_rad) * cos(degrees_to_radians(h_prime)),
    )))
}

/// Atmospheric refraction correction Δe, degrees.
///
/// Zero below the horizon threshold; the Bennett-style formula diverges
/// there, and a sun that far down is not visibly refracted anyway.
fn refraction_correction(environment: &Environment, e0: f64) -> f64 {
    let threshold = -(SUN_RADIUS_DEGREES + environment.atmospheric_refraction);
    if e0 < threshold {
        return 0.0;
    }

    (environment.pressure / 1010.0) * (283.0 / (273.0 + environment.temperature)) * 1.02
        / (60.0 * tan(degrees_to_radians(e0 + 10.3 / (e0 + 5.11))))
}

// ============================================================================
// Output synthesis
// ============================================================================

/// Astronomers' azimuth Γ in degrees from south, west positive, [0, 360).
fn topocentric_astronomers_azimuth(h_prime: f64, delta_prime: f64, latitude: f64) -> f64 {
    let h_prime_rad = degrees_to_radians(h_prime);
    let phi = degrees_to_radians(latitude);
    normalize_degrees_0_to_360(radians_to_degrees(atan2(
        sin(h_prime_rad),
        mul_add(
            cos(h_prime_rad),
            sin(phi),
            -(tan(degrees_to_radians(delta_prime)) * cos(phi)),
        ),
    )))
}

/// Incidence angle on the tilted surface, degrees.
fn surface_incidence_angle(zenith: f64, azimuth_astro: f64, environment: &Environment) -> f64 {
    let zenith_rad = degrees_to_radians(zenith);
    let slope_rad = degrees_to_radians(environment.slope);
    radians_to_degrees(acos_clamped(mul_add(
        cos(zenith_rad),
        cos(slope_rad),
        sin(slope_rad)
            * sin(zenith_rad)
            * cos(degrees_to_radians(azimuth_astro - environment.azimuth_rotation)),
    )))
}

/// Equation of time in minutes, folded into (-20, 20].
fn equation_of_time_minutes(im: &Intermediate) -> f64 {
    let m = normalize_degrees_0_to_360(polynomial(&SUN_MEAN_LONGITUDE_COEFFS, im.jme));
    fold_minutes(
        4.0 * (m - 0.0057183 - im.alpha + im.delta_psi * cos(degrees_to_radians(im.epsilon))),
    )
}

// ============================================================================
// Sunrise, transit, sunset
// ============================================================================

/// Day-event results handed back to the dispatcher.
struct DaySolve {
    events: SunriseResult<LocalHours>,
    transit_altitude: Option<f64>,
    sunrise_hour_angle: Option<f64>,
    sunset_hour_angle: Option<f64>,
}

/// How the sun relates to the horizon on a given day.
enum HorizonCrossing {
    /// Regular day; half day-arc hour angle H0 in degrees.
    Regular(f64),
    /// Sun never goes below the horizon.
    AlwaysAbove,
    /// Sun never comes up to the horizon.
    AlwaysBelow,
}

/// Classifies the day and computes the half day-arc H0.
///
/// The acos argument is deliberately not clamped here: overshoot below -1
/// means the sun never sets, above +1 that it never rises.
fn horizon_crossing(latitude: f64, delta_zero: f64, h0_prime: f64) -> HorizonCrossing {
    let phi = degrees_to_radians(latitude);
    let delta_rad = degrees_to_radians(delta_zero);
    let argument = (sin(degrees_to_radians(h0_prime)) - sin(phi) * sin(delta_rad))
        / (cos(phi) * cos(delta_rad));

    if argument < -1.0 {
        HorizonCrossing::AlwaysAbove
    } else if argument > 1.0 {
        HorizonCrossing::AlwaysBelow
    } else {
        HorizonCrossing::Regular(fold_degrees_0_to_180(radians_to_degrees(crate::math::acos(
            argument,
        ))))
    }
}

/// Three-point interpolation of α or δ across the bracketing days.
fn interpolate_three_days(values: &[f64; 3], n: f64) -> f64 {
    // Day-to-day right ascension jumps across the 360° wrap; fold those.
    let mut a = values[1] - values[0];
    let mut b = values[2] - values[1];
    if a <= -2.0 || a >= 2.0 {
        a = fold_unit_interval(a);
    }
    if b <= -2.0 || b >= 2.0 {
        b = fold_unit_interval(b);
    }
    values[1] + n * (a + b + (b - a) * n) / 2.0
}

/// Sun altitude for the rise/set correction, degrees.
fn rise_set_altitude(latitude: f64, delta_prime: f64, h_prime: f64) -> f64 {
    let phi = degrees_to_radians(latitude);
    let delta_prime_rad = degrees_to_radians(delta_prime);
    radians_to_degrees(asin_clamped(mul_add(
        sin(phi),
        sin(delta_prime_rad),
        cos(phi) * cos(delta_prime_rad) * cos(degrees_to_radians(h_prime)),
    )))
}

/// Folds degrees into [0, 180).
fn fold_degrees_0_to_180(degrees: f64) -> f64 {
    let half_turns = degrees / 180.0;
    let limited = 180.0 * (half_turns - floor(half_turns));
    if limited < 0.0 {
        limited + 180.0
    } else {
        limited
    }
}

/// Converts a UT day fraction to fractional local clock hours.
fn day_fraction_to_local_hours(day_fraction: f64, utc_offset: f64) -> LocalHours {
    LocalHours::from_hours(24.0 * fold_unit_interval(day_fraction + utc_offset / 24.0))
}

/// Solves sunrise, transit and sunset for the calendar date of `time`.
///
/// Closed-form spherical solution over the geocentric position at 0 UT of
/// the day before, the day itself and the day after (reference appendix
/// A.2); fixed cost, no convergence loop.
fn rise_transit_set(
    time: &CalendarTime,
    deltas: &TimeDeltas,
    environment: &Environment,
) -> Result<DaySolve> {
    // 0 UT of the calendar date; ΔUT1 plays no role at day resolution.
    let midnight = CalendarTime {
        hour: 0,
        minute: 0,
        second: 0.0,
        utc_offset: 0.0,
        ..*time
    };
    let jd_midnight = JulianDate::from_calendar(
        &midnight,
        &TimeDeltas {
            delta_ut1: 0.0,
            delta_t: deltas.delta_t,
        },
    )?;

    // Apparent sidereal time at 0 UT uses the full ΔT; the three bracketing
    // positions are evaluated with ΔT = 0 and re-corrected via A.2.9.
    let nu = geocentric_stages(&jd_midnight).nu;

    let mut alpha = [0.0; 3];
    let mut delta = [0.0; 3];
    for day_offset in 0..3 {
        let jd_day = JulianDate::from_parts(
            jd_midnight.julian_date() + f64::from(day_offset) - 1.0,
            0.0,
        );
        let position = geocentric_stages(&jd_day);
        alpha[day_offset as usize] = position.alpha;
        delta[day_offset as usize] = position.delta;
    }

    let m0 = (alpha[1] - environment.longitude - nu) / 360.0;
    let h0_prime = -(SUN_RADIUS_DEGREES + environment.atmospheric_refraction);
    let crossing = horizon_crossing(environment.latitude, delta[1], h0_prime);

    let h0_degrees = match &crossing {
        HorizonCrossing::Regular(h0) => *h0,
        // Polar day/night: only the transit column below is meaningful.
        HorizonCrossing::AlwaysAbove | HorizonCrossing::AlwaysBelow => 0.0,
    };

    // Approximate day fractions for transit, sunrise, sunset.
    let m = [
        fold_unit_interval(m0),
        fold_unit_interval(m0 - h0_degrees / 360.0),
        fold_unit_interval(m0 + h0_degrees / 360.0),
    ];

    // A.2.8..12: sidereal times, ΔT re-correction, interpolated positions,
    // local hour angles and altitudes at the three approximations.
    let mut h_prime = [0.0; 3];
    let mut delta_prime = [0.0; 3];
    let mut altitude = [0.0; 3];
    for i in 0..3 {
        let nu_i = mul_add(SIDEREAL_DEGREES_PER_DAY, m[i], nu);
        let n = m[i] + deltas.delta_t / SECONDS_PER_DAY;
        let alpha_prime = interpolate_three_days(&alpha, n);
        delta_prime[i] = interpolate_three_days(&delta, n);
        h_prime[i] = normalize_degrees_pm180(nu_i + environment.longitude - alpha_prime);
        altitude[i] = rise_set_altitude(environment.latitude, delta_prime[i], h_prime[i]);
    }

    // A.2.13..15: final corrections, in day fractions.
    let phi = degrees_to_radians(environment.latitude);
    let transit_fraction = m[0] - h_prime[0] / 360.0;
    let rise_set_fraction = |i: usize| {
        m[i] + (altitude[i] - h0_prime)
            / (360.0
                * cos(degrees_to_radians(delta_prime[i]))
                * cos(phi)
                * sin(degrees_to_radians(h_prime[i])))
    };

    let transit = day_fraction_to_local_hours(transit_fraction, time.utc_offset);
    let solve = match crossing {
        HorizonCrossing::Regular(_) => DaySolve {
            events: SunriseResult::RegularDay {
                sunrise: day_fraction_to_local_hours(rise_set_fraction(1), time.utc_offset),
                transit,
                sunset: day_fraction_to_local_hours(rise_set_fraction(2), time.utc_offset),
            },
            transit_altitude: Some(altitude[0]),
            sunrise_hour_angle: Some(h_prime[1]),
            sunset_hour_angle: Some(h_prime[2]),
        },
        HorizonCrossing::AlwaysAbove => DaySolve {
            events: SunriseResult::AllDay { transit },
            transit_altitude: None,
            sunrise_hour_angle: None,
            sunset_hour_angle: None,
        },
        HorizonCrossing::AlwaysBelow => DaySolve {
            events: SunriseResult::AllNight { transit },
            transit_altitude: None,
            sunrise_hour_angle: None,
            sunset_hour_angle: None,
        },
    };
    Ok(solve)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_time() -> CalendarTime {
        CalendarTime::new(2003, 10, 17, 12, 30, 30.0, -7.0)
    }

    fn reference_deltas() -> TimeDeltas {
        TimeDeltas::new(0.0, 67.0).unwrap()
    }

    fn reference_environment() -> Environment {
        Environment {
            latitude: 39.742476,
            longitude: -105.1786,
            elevation: 1830.14,
            pressure: 820.0,
            temperature: 11.0,
            slope: 30.0,
            azimuth_rotation: -10.0,
            atmospheric_refraction: 0.5667,
        }
    }

    #[test]
    fn test_reference_intermediates() {
        let (_, im) = calculate_with_intermediate(
            &reference_time(),
            &reference_deltas(),
            &reference_environment(),
            CalculationMode::All,
        )
        .unwrap();

        assert!((im.jd - 2452930.312847).abs() < 1e-6);
        assert!((im.l - 24.0182616917).abs() < 1e-6);
        assert!((im.b - -0.0001011219).abs() < 1e-8);
        assert!((im.r - 0.9965422974).abs() < 1e-8);
        assert!((im.theta - 204.0182616917).abs() < 1e-6);
        assert!((im.delta_psi - -0.00399840).abs() < 1e-6);
        assert!((im.delta_epsilon - 0.00166657).abs() < 1e-6);
        assert!((im.epsilon - 23.440465).abs() < 1e-6);
        assert!((im.lambda - 204.0085519281).abs() < 1e-6);
        assert!((im.alpha - 202.22741).abs() < 1e-4);
        assert!((im.delta - -9.31434).abs() < 1e-4);
        assert!((im.h - 11.105900).abs() < 1e-4);
        assert!((im.delta_prime - -9.316179).abs() < 1e-4);
        assert!((im.h_prime - 11.10629).abs() < 1e-4);
    }

    #[test]
    fn test_reference_outputs() {
        let output = calculate(
            &reference_time(),
            &reference_deltas(),
            &reference_environment(),
            CalculationMode::All,
        )
        .unwrap();

        assert!((output.zenith - 50.111622).abs() < 1e-4);
        assert!((output.azimuth - 194.340241).abs() < 1e-4);
        assert!((output.incidence.unwrap() - 25.187000).abs() < 1e-4);
        assert!((output.equation_of_time.unwrap() - 14.641503).abs() < 1e-3);
    }

    #[test]
    fn test_mode_pruning_is_semantically_neutral() {
        let time = reference_time();
        let deltas = reference_deltas();
        let env = reference_environment();

        let minimal = calculate(&time, &deltas, &env, CalculationMode::ZenithAzimuth).unwrap();
        let full = calculate(&time, &deltas, &env, CalculationMode::All).unwrap();

        assert_eq!(minimal.zenith, full.zenith);
        assert_eq!(minimal.azimuth, full.azimuth);
        assert_eq!(minimal.azimuth_astro, full.azimuth_astro);
        assert!(minimal.incidence.is_none());
        assert!(minimal.equation_of_time.is_none());
        assert!(minimal.day_events.is_none());
        assert!(full.incidence.is_some());
        assert!(full.day_events.is_some());
    }

    #[test]
    fn test_validation_runs_before_any_stage() {
        let deltas = reference_deltas();
        let env = reference_environment();

        let mut bad_latitude = env;
        bad_latitude.latitude = 90.5;
        assert!(calculate(
            &reference_time(),
            &deltas,
            &bad_latitude,
            CalculationMode::ZenithAzimuth
        )
        .is_err());

        let mut bad_slope = env;
        bad_slope.slope = 200.0;
        assert!(
            calculate(&reference_time(), &deltas, &bad_slope, CalculationMode::All).is_err()
        );

        let mut bad_time = reference_time();
        bad_time.year = 6001;
        assert!(calculate(&bad_time, &deltas, &env, CalculationMode::ZenithAzimuth).is_err());

        let bad_deltas = TimeDeltas {
            delta_ut1: 1.5,
            delta_t: 67.0,
        };
        assert!(calculate(
            &reference_time(),
            &bad_deltas,
            &env,
            CalculationMode::ZenithAzimuth
        )
        .is_err());
    }

    #[test]
    fn test_refraction_zero_below_threshold() {
        let env = reference_environment();
        let threshold = -(SUN_RADIUS_DEGREES + env.atmospheric_refraction);

        assert_eq!(refraction_correction(&env, threshold - 1e-9), 0.0);
        assert_eq!(refraction_correction(&env, -10.0), 0.0);
        assert!(refraction_correction(&env, threshold + 1e-9) > 0.0);
        assert!(refraction_correction(&env, 10.0) > 0.0);
    }

    #[test]
    fn test_horizon_crossing_classification() {
        // Midsummer at 80°N, declination +20°: sun never sets.
        assert!(matches!(
            horizon_crossing(80.0, 20.0, -0.8334),
            HorizonCrossing::AlwaysAbove
        ));
        // Midwinter at 80°N, declination -20°: sun never rises.
        assert!(matches!(
            horizon_crossing(80.0, -20.0, -0.8334),
            HorizonCrossing::AlwaysBelow
        ));
        // Mid-latitude equinox: regular day near a 90° half arc.
        match horizon_crossing(40.0, 0.0, -0.8334) {
            HorizonCrossing::Regular(h0) => assert!((h0 - 91.0).abs() < 1.0),
            _ => panic!("expected a regular day"),
        }
    }

    #[test]
    fn test_incidence_flat_surface_equals_zenith() {
        let mut env = reference_environment();
        env.slope = 0.0;
        env.azimuth_rotation = 0.0;

        let output = calculate(
            &reference_time(),
            &reference_deltas(),
            &env,
            CalculationMode::ZenithAzimuthIncidence,
        )
        .unwrap();
        assert!((output.incidence.unwrap() - output.zenith).abs() < 1e-9);
    }

    #[test]
    fn test_output_ranges_over_sweep() {
        let deltas = TimeDeltas::default();
        for &latitude in &[-89.9, -45.0, 0.0, 45.0, 89.9] {
            for &longitude in &[-180.0, -60.0, 0.0, 120.0, 180.0] {
                for &hour in &[0, 6, 12, 18] {
                    let time = CalendarTime::new(2024, 3, 20, hour, 0, 0.0, 0.0);
                    let env = Environment::new(latitude, longitude);
                    let output =
                        calculate(&time, &deltas, &env, CalculationMode::ZenithAzimuth).unwrap();
                    assert!((0.0..=180.0).contains(&output.zenith));
                    assert!((0.0..360.0).contains(&output.azimuth));
                }
            }
        }
    }
}
