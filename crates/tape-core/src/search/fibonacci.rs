//! Fibonacci search for the maximum of a unimodal function on discrete points.
//!
//! This is golden-section search adapted to a discretised domain: the probe
//! positions are Fibonacci numbers, so every step reuses one previous
//! evaluation and the search needs O(log n) evaluations.

use crate::error::{DensityError, Result};

/// Find the point of `xs` that `f` maps to the highest value.
///
/// Returns the index into `xs` and the corresponding value. If `f` is
/// unimodal over the points the result is the global maximum; otherwise the
/// search still terminates but may return a local maximum. Lists shorter than
/// four points are scanned exhaustively.
///
/// # Errors
///
/// [`DensityError::EmptySearch`] for an empty list, or whatever `f` returns.
pub fn fibonacci_search_max<X, Y, F>(xs: &[X], mut f: F) -> Result<(usize, Y)>
where
    Y: PartialOrd,
    F: FnMut(&X) -> Result<Y>,
{
    if xs.is_empty() {
        return Err(DensityError::EmptySearch);
    }
    if xs.len() < 4 {
        return exhaustive_max(xs, f);
    }

    // m and n bound the bracket; j and k are the interior probes.
    let mut m = 0usize;
    let mut n = xs.len() - 1;
    let (mut j, mut k) = (0usize, 1usize);
    let mut fib = 0usize;
    while k < n {
        fib = j + k;
        j = k;
        k = fib;
    }
    let diff = k - j;
    k = j;
    j = diff;

    let mut low = f(&xs[j])?;
    let mut high = f(&xs[k])?;
    let mut min;
    let mut max;
    if n == fib {
        min = f(&xs[m])?;
        max = f(&xs[n])?;
    } else {
        if high > low {
            m = n - k;
            let step = k - j;
            k = m + j;
            j = m + step;
            max = f(&xs[n])?;
            high = f(&xs[k])?;
        } else {
            n = k;
            k = j;
            j = n - k;
            max = high;
            high = low;
        }
        min = f(&xs[m])?;
        low = f(&xs[j])?;
    }

    loop {
        if high > low {
            if n - k == 1 {
                return Ok(if max > high { (n, max) } else { (k, high) });
            }
            let step = j - m;
            m = j;
            j = k;
            k = m + step;
            min = low;
            low = high;
            high = f(&xs[k])?;
        } else {
            if j - m == 1 {
                return Ok(if low > min { (j, low) } else { (m, min) });
            }
            let step = k - j;
            n = k;
            k = j;
            j = m + step;
            max = high;
            high = low;
            low = f(&xs[j])?;
        }
    }
}

/// Evaluate every point and keep the first maximum.
pub fn exhaustive_max<X, Y, F>(xs: &[X], mut f: F) -> Result<(usize, Y)>
where
    Y: PartialOrd,
    F: FnMut(&X) -> Result<Y>,
{
    let (first, rest) = xs.split_first().ok_or(DensityError::EmptySearch)?;
    let mut best = (0, f(first)?);
    for (i, x) in rest.iter().enumerate() {
        let value = f(x)?;
        if value > best.1 {
            best = (i + 1, value);
        }
    }
    Ok(best)
}
