//! Math functions for no_std compatibility.
//!
//! In no_std mode, f64 doesn't have transcendental methods like sqrt, ln, cos, etc.
//! This module provides these functions using libm, plus the angle helpers the
//! density code shares.

use core::f64::consts::{PI, TAU};

use crate::types::Complex64;

/// Absolute value.
#[inline]
pub fn abs(x: f64) -> f64 {
    libm::fabs(x)
}

/// Square root.
#[inline]
pub fn sqrt(x: f64) -> f64 {
    libm::sqrt(x)
}

/// Natural logarithm.
#[inline]
pub fn ln(x: f64) -> f64 {
    libm::log(x)
}

/// Cosine.
#[inline]
pub fn cos(x: f64) -> f64 {
    libm::cos(x)
}

/// Exponential (e^x).
#[inline]
pub fn exp(x: f64) -> f64 {
    libm::exp(x)
}

/// Ceiling (round up).
#[inline]
pub fn ceil(x: f64) -> f64 {
    libm::ceil(x)
}

/// Power (x^y).
#[inline]
pub fn pow(x: f64, y: f64) -> f64 {
    libm::pow(x, y)
}

/// Floating-point remainder with the sign of `x`.
#[inline]
pub fn fmod(x: f64, y: f64) -> f64 {
    libm::fmod(x, y)
}

/// Load exponent: x * 2^n.
#[inline]
pub fn ldexp(x: f64, n: i32) -> f64 {
    libm::ldexp(x, n)
}

/// Square of a value.
#[inline]
pub fn sq(x: f64) -> f64 {
    x * x
}

// =============================================================================
// Angles
// =============================================================================

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = fmod(angle, TAU);
    if wrapped < 0.0 {
        let shifted = wrapped + TAU;
        // -tiny + 2π rounds to 2π
        if shifted >= TAU {
            0.0
        } else {
            shifted
        }
    } else {
        wrapped
    }
}

/// Fold an angle in `(-π, 2π)` into `[0, π)` (the π-periodic angle ambiguity).
#[inline]
pub fn fold_half_turn(angle: f64) -> f64 {
    if angle >= PI {
        angle - PI
    } else if angle < 0.0 {
        angle + PI
    } else {
        angle
    }
}

/// Unit phasor `e^{iθ}`.
#[inline]
pub fn phasor(angle: f64) -> Complex64 {
    Complex64::from_polar(1.0, angle)
}

/// `Re(c · e^{iθ})` given the phasor `e^{iθ}`.
#[inline]
pub fn re_mul(c: Complex64, phasor: Complex64) -> f64 {
    c.re * phasor.re - c.im * phasor.im
}

/// z-component of the cross product `a × b` of two phasors.
///
/// Positive when `b` lies counter-clockwise from `a` by less than π.
#[inline]
pub fn cross(a: Complex64, b: Complex64) -> f64 {
    a.re * b.im - a.im * b.re
}

/// Greatest common divisor.
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_two_pi_range() {
        assert_eq!(wrap_two_pi(0.0), 0.0);
        assert!((wrap_two_pi(-0.5) - (TAU - 0.5)).abs() < 1e-15);
        assert!((wrap_two_pi(TAU + 0.25) - 0.25).abs() < 1e-15);
        assert!((wrap_two_pi(-3.0 * TAU - 1.0) - (TAU - 1.0)).abs() < 1e-12);
        assert!(wrap_two_pi(-1e-300) < TAU);
    }

    #[test]
    fn fold_half_turn_range() {
        assert!((fold_half_turn(PI + 0.5) - 0.5).abs() < 1e-15);
        assert!((fold_half_turn(-0.5) - (PI - 0.5)).abs() < 1e-15);
        assert_eq!(fold_half_turn(1.0), 1.0);
    }

    #[test]
    fn cross_sign() {
        let a = phasor(0.0);
        assert!(cross(a, phasor(0.3)) > 0.0);
        assert!(cross(a, phasor(-0.3)) < 0.0);
    }

    #[test]
    fn gcd_values() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 1), 1);
        assert_eq!(gcd(5, 0), 5);
        assert_eq!(gcd(4, 4), 4);
    }
}
