//! Numeric helpers shared by the pipeline stages.
//!
//! Trigonometric functions dispatch to `std` intrinsics or `libm` depending
//! on the target configuration, so the pipeline itself stays agnostic.

#![allow(clippy::many_single_char_names)]

#[cfg(not(feature = "std"))]
use libm;

macro_rules! unary_math_fn {
    ($(#[$doc:meta] $name:ident),+ $(,)?) => {
        $(
            #[$doc]
            #[inline]
            pub fn $name(x: f64) -> f64 {
                #[cfg(feature = "std")]
                return x.$name();

                #[cfg(not(feature = "std"))]
                return libm::$name(x);
            }
        )+
    };
}

unary_math_fn! {
    /// sin(x), x in radians.
    sin,
    /// cos(x), x in radians.
    cos,
    /// tan(x), x in radians.
    tan,
    /// asin(x) in radians.
    asin,
    /// acos(x) in radians.
    acos,
    /// atan(x) in radians.
    atan,
    /// Largest integer value not greater than x.
    floor,
}

/// atan2(y, x) in radians, quadrant-aware.
#[inline]
pub fn atan2(y: f64, x: f64) -> f64 {
    #[cfg(feature = "std")]
    return y.atan2(x);

    #[cfg(not(feature = "std"))]
    return libm::atan2(y, x);
}

/// Fused multiply-add: (x * a) + b with a single rounding.
#[inline]
pub fn mul_add(x: f64, a: f64, b: f64) -> f64 {
    #[cfg(feature = "std")]
    return x.mul_add(a, b);

    #[cfg(not(feature = "std"))]
    return libm::fma(x, a, b);
}

/// Converts degrees to radians.
#[inline]
pub const fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Converts radians to degrees.
#[inline]
pub const fn radians_to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Clamps an inverse-trigonometric argument to the unit interval.
///
/// Floating error near the poles and the horizon can push a sine/cosine
/// combination a few ulp past ±1; the reduction treats such overshoot as
/// exactly ±1 rather than letting `asin`/`acos` return NaN.
#[inline]
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// asin with the argument clamped to [-1, 1].
#[inline]
pub fn asin_clamped(x: f64) -> f64 {
    asin(clamp_unit(x))
}

/// acos with the argument clamped to [-1, 1].
#[inline]
pub fn acos_clamped(x: f64) -> f64 {
    acos(clamp_unit(x))
}

/// Normalizes an angle in degrees to the range [0, 360).
pub fn normalize_degrees_0_to_360(degrees: f64) -> f64 {
    let normalized = degrees % 360.0;
    if normalized < 0.0 {
        normalized + 360.0
    } else {
        normalized
    }
}

/// Normalizes an angle in degrees to the range [-180, 180].
pub fn normalize_degrees_pm180(degrees: f64) -> f64 {
    let turns = degrees / 360.0;
    let limited = 360.0 * (turns - floor(turns));
    if limited < -180.0 {
        limited + 360.0
    } else if limited > 180.0 {
        limited - 360.0
    } else {
        limited
    }
}

/// Folds a day fraction into [0, 1).
pub fn fold_unit_interval(value: f64) -> f64 {
    let folded = value - floor(value);
    if folded < 0.0 {
        folded + 1.0
    } else {
        folded
    }
}

/// Folds an equation-of-time value into (-20, 20] minutes.
///
/// The raw expression can land a whole day (1440 minutes) off around the
/// right-ascension wrap.
pub fn fold_minutes(minutes: f64) -> f64 {
    if minutes < -20.0 {
        minutes + 1440.0
    } else if minutes > 20.0 {
        minutes - 1440.0
    } else {
        minutes
    }
}

/// Computes a polynomial using Horner's method for numerical stability.
///
/// Coefficients are ordered [a₀, a₁, a₂, ...] for a₀ + a₁x + a₂x² + ...
pub fn polynomial(coeffs: &[f64], x: f64) -> f64 {
    let Some(&last) = coeffs.last() else {
        return 0.0;
    };

    let mut result = last;
    for &coeff in coeffs.iter().rev().skip(1) {
        result = mul_add(result, x, coeff);
    }
    result
}
