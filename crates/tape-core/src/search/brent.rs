//! Bracketed derivative-free minimization (Brent's method).

use crate::constants::{BRENT_MAX_ITERATIONS, PEAK_PRECISION_BITS};
use crate::error::Result;
use crate::math::{abs, ldexp};

/// Location and value of a minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    /// Argument of the minimum.
    pub x: f64,
    /// Function value there.
    pub value: f64,
}

const GOLDEN: f64 = 0.3819660;

/// Minimise `f` on `[lower, upper]` to a relative precision of `2^(1 - bits)`.
///
/// Combines golden-section steps with parabolic interpolation. The search
/// starts from the upper bound and stops after at most
/// [`BRENT_MAX_ITERATIONS`] evaluations. `bits` above half the f64 mantissa
/// are clamped, since a minimum cannot be located more precisely than
/// `sqrt(ε)`.
pub fn brent_minimize<F>(mut f: F, lower: f64, upper: f64, bits: u32) -> Result<Minimum>
where
    F: FnMut(f64) -> Result<f64>,
{
    let bits = bits.clamp(1, PEAK_PRECISION_BITS);
    let tolerance = ldexp(1.0, 1 - bits as i32);
    let (mut min, mut max) = if lower <= upper {
        (lower, upper)
    } else {
        (upper, lower)
    };

    let mut x = max;
    let mut w = max;
    let mut v = max;
    let mut fx = f(x)?;
    let mut fw = fx;
    let mut fv = fx;
    let mut delta = 0.0f64;
    let mut delta2 = 0.0f64;

    for _ in 0..BRENT_MAX_ITERATIONS {
        let mid = (min + max) / 2.0;
        let fract1 = tolerance * abs(x) + tolerance / 4.0;
        let fract2 = 2.0 * fract1;
        if abs(x - mid) <= fract2 - (max - min) / 2.0 {
            break;
        }

        let mut golden_step = true;
        if abs(delta2) > fract1 {
            // Parabolic fit through x, w, v.
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = abs(q);
            let td = delta2;
            delta2 = delta;
            if abs(p) < abs(q * td / 2.0) && p > q * (min - x) && p < q * (max - x) {
                golden_step = false;
                delta = p / q;
                let u = x + delta;
                if (u - min) < fract2 || (max - u) < fract2 {
                    delta = if mid - x < 0.0 { -abs(fract1) } else { abs(fract1) };
                }
            }
        }
        if golden_step {
            delta2 = if x >= mid { min - x } else { max - x };
            delta = GOLDEN * delta2;
        }

        let u = if abs(delta) >= fract1 {
            x + delta
        } else if delta > 0.0 {
            x + abs(fract1)
        } else {
            x - abs(fract1)
        };
        let fu = f(u)?;

        if fu <= fx {
            if u >= x {
                min = x;
            } else {
                max = x;
            }
            v = w;
            w = x;
            x = u;
            fv = fw;
            fw = fx;
            fx = fu;
        } else {
            if u < x {
                min = u;
            } else {
                max = u;
            }
            if fu <= fw || w == x {
                v = w;
                w = u;
                fv = fw;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    Ok(Minimum { x, value: fx })
}
