//! Indexable sources of Fourier coefficients.
//!
//! Gain formulas are written once against [`CoeffSource`] and evaluated either
//! on the live coefficient array ([`DenseCoeffs`]) or on a sparse
//! [`CoeffSubset`] carried through the lookahead recursion.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{DensityError, Result};
use crate::search::index_set::{is_strictly_increasing, search_sorted};
use crate::types::{Complex64, C_ONE, C_ZERO};

/// Read access to the coefficients of a truncated Fourier series.
pub trait CoeffSource {
    /// Truncation order N of the full series this source belongs to.
    fn order(&self) -> usize;

    /// Coefficient `c_n`.
    ///
    /// # Errors
    ///
    /// Sparse sources fail on indices they do not hold.
    fn coeff(&self, n: usize) -> Result<Complex64>;
}

/// The leading `order + 1` coefficients of a dense array.
#[derive(Debug, Clone, Copy)]
pub struct DenseCoeffs<'a> {
    order: usize,
    coeffs: &'a [Complex64],
}

impl<'a> DenseCoeffs<'a> {
    /// Wrap `coeffs`, of which indices `0..=order` are meaningful.
    pub fn new(order: usize, coeffs: &'a [Complex64]) -> Self {
        Self { order, coeffs }
    }
}

impl CoeffSource for DenseCoeffs<'_> {
    fn order(&self) -> usize {
        self.order
    }

    fn coeff(&self, n: usize) -> Result<Complex64> {
        if n > self.order {
            return Ok(C_ZERO);
        }
        self.coeffs
            .get(n)
            .copied()
            .ok_or(DensityError::IndexOutOfRange {
                index: n,
                max: self.coeffs.len().saturating_sub(1),
            })
    }
}

/// A sparse, explicitly indexed slice of a density's coefficients.
///
/// `order` is the truncation order of the full density the subset was derived
/// against. Looking up an index not held by the subset is an error rather
/// than a zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffSubset {
    order: usize,
    idx: Vec<usize>,
    cfs: Vec<Complex64>,
}

impl CoeffSubset {
    /// Create a zeroed subset over `idx`, which must be strictly increasing.
    pub fn new(order: usize, idx: Vec<usize>) -> Result<Self> {
        if !is_strictly_increasing(&idx) {
            return Err(DensityError::UnsortedIndices);
        }
        Ok(Self::from_sorted(order, idx))
    }

    /// Create a subset from indices and matching coefficients.
    pub fn from_parts(order: usize, idx: Vec<usize>, cfs: Vec<Complex64>) -> Result<Self> {
        if idx.len() != cfs.len() {
            return Err(DensityError::LengthMismatch {
                parameter: "subset coefficients",
                given: cfs.len(),
                expected: idx.len(),
            });
        }
        if !is_strictly_increasing(&idx) {
            return Err(DensityError::UnsortedIndices);
        }
        Ok(Self { order, idx, cfs })
    }

    /// Subset over indices already known to be strictly increasing.
    pub(crate) fn from_sorted(order: usize, idx: Vec<usize>) -> Self {
        let mut cfs = vec![C_ZERO; idx.len()];
        if idx.first() == Some(&0) {
            cfs[0] = C_ONE;
        }
        Self { order, idx, cfs }
    }

    /// Truncation order of the full density.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Held indices, strictly increasing.
    pub fn indices(&self) -> &[usize] {
        &self.idx
    }

    /// Held coefficients, in index order.
    pub fn coefficients(&self) -> &[Complex64] {
        &self.cfs
    }

    /// Number of held coefficients.
    pub fn len(&self) -> usize {
        self.idx.len()
    }

    /// Whether the subset holds no coefficients.
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    fn position(&self, n: usize) -> Result<usize> {
        match search_sorted(&self.idx, n) {
            (i, true) => Ok(i),
            (_, false) => Err(DensityError::MissingIndex(n)),
        }
    }

    /// Coefficient at index `n`.
    pub fn get(&self, n: usize) -> Result<Complex64> {
        self.position(n).map(|i| self.cfs[i])
    }

    /// Mutable coefficient at index `n`.
    pub fn get_mut(&mut self, n: usize) -> Result<&mut Complex64> {
        let i = self.position(n)?;
        Ok(&mut self.cfs[i])
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Complex64] {
        &mut self.cfs
    }
}

impl CoeffSource for CoeffSubset {
    fn order(&self) -> usize {
        self.order
    }

    fn coeff(&self, n: usize) -> Result<Complex64> {
        self.get(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_reads_zero_past_order() {
        let cfs = [C_ONE, Complex64::new(0.5, 0.1), Complex64::new(0.2, 0.0)];
        let dense = DenseCoeffs::new(1, &cfs);
        assert_eq!(dense.coeff(1).unwrap(), Complex64::new(0.5, 0.1));
        assert_eq!(dense.coeff(2).unwrap(), C_ZERO);
        assert_eq!(dense.order(), 1);
    }

    #[test]
    fn subset_lookup() {
        let mut subset = CoeffSubset::new(10, vec![0, 2, 5]).unwrap();
        assert_eq!(subset.get(0).unwrap(), C_ONE);
        assert_eq!(subset.get(2).unwrap(), C_ZERO);
        *subset.get_mut(5).unwrap() = Complex64::new(0.3, -0.2);
        assert_eq!(subset.coeff(5).unwrap(), Complex64::new(0.3, -0.2));
        assert_eq!(subset.order(), 10);
        assert_eq!(subset.len(), 3);
    }

    #[test]
    fn subset_missing_index_fails() {
        let subset = CoeffSubset::new(10, vec![1, 3]).unwrap();
        assert_eq!(subset.get(2), Err(DensityError::MissingIndex(2)));
        assert_eq!(subset.get(11), Err(DensityError::MissingIndex(11)));
    }

    #[test]
    fn subset_rejects_unsorted() {
        assert_eq!(
            CoeffSubset::new(4, vec![2, 1]),
            Err(DensityError::UnsortedIndices)
        );
        assert_eq!(
            CoeffSubset::new(4, vec![1, 1]),
            Err(DensityError::UnsortedIndices)
        );
        assert!(matches!(
            CoeffSubset::from_parts(4, vec![1, 2], vec![C_ZERO]),
            Err(DensityError::LengthMismatch { .. })
        ));
    }
}
