//! Resampling densities between magnifications.
//!
//! Contraction keeps every `M_rel`-th coefficient and re-centres the mean;
//! expansion upsamples a coarser density into a finer one under an envelope.
//! [`PhaseDensity::set_density`] composes both to fuse densities collected at
//! different zoom levels.

use alloc::vec::Vec;
use core::f64::consts::{PI, TAU};


use super::{rotate, PhaseDensity};
use crate::error::{DensityError, Result};
use crate::math::{cross, gcd, phasor, wrap_two_pi};
use crate::types::{Complex64, ExpansionKind, C_ONE, C_ZERO};

impl PhaseDensity {
    /// Contraction of `source` onto magnification `magnification`, with the
    /// same capacity as `source`.
    pub fn contracted(source: &PhaseDensity, magnification: usize) -> Result<Self> {
        let mut density = source.clone();
        density.contract(source, magnification)?;
        Ok(density)
    }

    /// Re-derive this density as the contraction of `source` onto
    /// `magnification`, which must be a proper multiple of the source's.
    ///
    /// The new offset places the source's mean at the centre of the
    /// contracted range; the model is copied from `source`.
    pub fn contract(&mut self, source: &PhaseDensity, magnification: usize) -> Result<()> {
        let m_rel = contraction_ratio(source.magnification, magnification)?;
        let estimate = source.centre_estimate();
        self.copy_model_from(source);
        self.decimate(&source.coeffs, source.order, m_rel);
        self.magnification = magnification;
        self.offset = wrap_two_pi(estimate - PI / magnification as f64);
        self.recentre();
        Ok(())
    }

    /// Contract this density onto `magnification`.
    pub fn contract_in_place(&mut self, magnification: usize) -> Result<()> {
        let m_rel = contraction_ratio(self.magnification, magnification)?;
        let estimate = self.centre_estimate();
        let order = self.order / m_rel;
        // Reads run ahead of writes.
        for n in 1..=order {
            self.coeffs[n] = self.coeffs[n * m_rel];
        }
        for c in &mut self.coeffs[order + 1..] {
            *c = C_ZERO;
        }
        self.order = order;
        self.magnification = magnification;
        self.offset = wrap_two_pi(estimate - PI / magnification as f64);
        self.recentre();
        Ok(())
    }

    fn decimate(&mut self, source: &[Complex64], source_order: usize, m_rel: usize) {
        let mut order = source_order / m_rel;
        if order > self.n_max {
            tracing::warn!(
                order,
                n_max = self.n_max,
                "contracting into a density with too few coefficients"
            );
            order = self.n_max;
        }
        for (n, c) in self.coeffs.iter_mut().enumerate() {
            *c = if n <= order { source[n * m_rel] } else { C_ZERO };
        }
        self.order = order;
    }

    /// Mean estimate, or the range start for a uniform density.
    fn centre_estimate(&self) -> f64 {
        self.from_represented(self.represented_mean())
    }

    fn represented_mean(&self) -> f64 {
        if self.order >= 1 {
            wrap_two_pi(-self.coeffs[1].arg())
        } else {
            0.0
        }
    }

    /// Shift so the mean sits at the centre (π) of the represented range.
    fn recentre(&mut self) {
        if self.order >= 1 {
            let mean = self.represented_mean();
            self.shift(PI - mean);
        }
    }

    /// Upsample the coarser-range (higher magnification) `source` into this
    /// density.
    ///
    /// `source`'s magnification must be a multiple of this density's, and
    /// when this density is itself contracted the source's range must lie
    /// inside it.
    pub fn expand(&mut self, source: &PhaseDensity, kind: ExpansionKind) -> Result<()> {
        if source.magnification % self.magnification != 0 {
            return Err(DensityError::InvalidExpansion {
                source: source.magnification,
                target: self.magnification,
            });
        }
        let m_rel = source.magnification / self.magnification;

        if self.magnification > 1 && !self.covers(source) {
            return Err(DensityError::ExpansionOutOfRange);
        }

        let mut n_new = source.order * m_rel;
        if n_new > self.n_max {
            tracing::warn!(
                needed = n_new,
                n_max = self.n_max,
                "expanding into a density with too few coefficients"
            );
            n_new = self.n_max;
        }

        // Align the source with this density's offset.
        let dphi0 = wrap_two_pi(source.offset - self.offset);
        let mut aligned: Vec<Complex64> = source.coefficients().to_vec();
        rotate(
            &mut aligned,
            wrap_two_pi(source.magnification as f64 * dphi0),
        );

        // Wrapped-normal std of an envelope with |c_n| = exp(-2n²(2π/(3·M_rel))²).
        let envelope_std = 2.0 * TAU / (3 * m_rel) as f64;
        match kind {
            ExpansionKind::Uniform => {
                for (n, c) in self.coeffs.iter_mut().enumerate() {
                    *c = if n <= n_new && n % m_rel == 0 {
                        aligned[n / m_rel]
                    } else {
                        C_ZERO
                    };
                }
                self.order = n_new;
                return Ok(());
            }
            ExpansionKind::Gaussian => {
                let centre = self.magnification as f64 * dphi0 + PI / m_rel as f64;
                self.set_gaussian(centre, envelope_std);
            }
            ExpansionKind::GaussianSelfMean => {
                let mean = self.represented_mean();
                self.set_gaussian(mean, envelope_std);
            }
            ExpansionKind::SelfEnvelope => {}
        }
        self.apply_envelope(&aligned, m_rel, n_new)
    }

    /// Whether `other`'s range lies inside this density's range.
    ///
    /// Valid for ranges narrower than π; a small negative cross product is
    /// tolerated so coinciding bounds pass.
    fn covers(&self, other: &PhaseDensity) -> bool {
        let own_start = phasor(self.offset);
        let own_end = phasor(self.offset + TAU / self.magnification as f64);
        let start = phasor(other.offset);
        let end = phasor(other.offset + TAU / other.magnification as f64);
        let tol = self.tolerances.epsilon;
        cross(own_start, start) >= -tol && cross(end, own_end) >= -tol
    }

    /// Multiply this density by the upsampled `fine` series
    /// (`fine_n` sits at index `n·m_rel`) and renormalise.
    fn apply_envelope(&mut self, fine: &[Complex64], m_rel: usize, n_new: usize) -> Result<()> {
        let order = self.order;
        let fine_order = fine.len() - 1;
        let top = n_new.max(order);
        let own: Vec<Complex64> = self.coeffs[..=order].to_vec();
        for c in &mut self.coeffs[order + 1..=top] {
            *c = C_ZERO;
        }

        for n in 0..=top {
            let mut acc = self.coeffs[n];
            if n <= order {
                let j_max = ((order - n) / m_rel).min(fine_order);
                for j in 1..=j_max {
                    acc += own[n + m_rel * j] * fine[j].conj();
                }
            }

            let j_max = ((order + n) / m_rel).min(fine_order);
            for j in n / m_rel + 1..=j_max {
                acc += own[m_rel * j - n].conj() * fine[j];
            }

            let j_min = if n > order {
                (n - order).div_ceil(m_rel).max(1)
            } else {
                1
            };
            let j_max = (n / m_rel).min(fine_order);
            for j in j_min..=j_max {
                acc += own[n - m_rel * j] * fine[j];
            }
            self.coeffs[n] = acc;
        }

        let norm = self.coeffs[0];
        if norm.re <= self.tolerances.small {
            return Err(DensityError::NumericLimit {
                quantity: "expanded density normalization",
            });
        }
        for c in &mut self.coeffs[1..=top] {
            *c /= norm;
        }
        self.coeffs[0] = C_ONE;
        self.order = top;
        Ok(())
    }

    /// Fuse this density with `other` and resample the result onto
    /// `magnification`.
    ///
    /// Both are expanded into a workspace at the greatest common
    /// magnification: the lower-magnification one with a uniform envelope,
    /// then the other one enveloped by it. The workspace is then contracted
    /// onto `magnification` (or copied when no contraction is needed). The
    /// model is taken from `other`.
    pub fn set_density(&mut self, other: &PhaseDensity, magnification: usize) -> Result<()> {
        if magnification < 1 {
            return Err(DensityError::InvalidMagnification(magnification));
        }
        let common = gcd(gcd(self.magnification, other.magnification), magnification);
        let capacity = (self.n_max * self.magnification / common)
            .max(other.n_max * other.magnification / common);

        let workspace = {
            let (coarse, fine) = if self.magnification > other.magnification {
                (other, &*self)
            } else {
                (&*self, other)
            };
            let mut workspace = PhaseDensity::scratch(capacity, common, 0.0)?;
            if common > 1 {
                workspace.offset = wrap_two_pi(coarse.centre_estimate() - PI / common as f64);
            }
            workspace.expand(coarse, ExpansionKind::Uniform)?;
            workspace.expand(fine, ExpansionKind::SelfEnvelope)?;
            workspace
        };
        tracing::debug!(
            common,
            capacity,
            order = workspace.order,
            "fused densities in common workspace"
        );

        if common == magnification {
            let mut order = workspace.order;
            if order > self.n_max {
                tracing::warn!(
                    order,
                    n_max = self.n_max,
                    "fused density truncated to capacity"
                );
                order = self.n_max;
            }
            for (n, c) in self.coeffs.iter_mut().enumerate() {
                *c = if n <= order { workspace.coeffs[n] } else { C_ZERO };
            }
            self.order = order;
            self.magnification = magnification;
            self.offset = workspace.offset;
        } else {
            self.contract(&workspace, magnification)?;
        }
        self.copy_model_from(other);
        Ok(())
    }
}

fn contraction_ratio(source: usize, target: usize) -> Result<usize> {
    if target == 0 || target % source != 0 || target == source {
        return Err(DensityError::InvalidContraction { source, target });
    }
    Ok(target / source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn gaussian(n_max: usize, mean: f64, std: f64) -> PhaseDensity {
        let mut d = PhaseDensity::new(n_max, 1).unwrap();
        d.set_gaussian(mean, std);
        d
    }

    #[test]
    fn contraction_requires_proper_multiple() {
        let d = gaussian(32, 1.0, 0.3);
        assert_eq!(
            PhaseDensity::contracted(&d, 1),
            Err(DensityError::InvalidContraction {
                source: 1,
                target: 1
            })
        );
        let c = PhaseDensity::contracted(&d, 2).unwrap();
        assert_eq!(
            PhaseDensity::contracted(&c, 3),
            Err(DensityError::InvalidContraction {
                source: 2,
                target: 3
            })
        );
    }

    #[test]
    fn contraction_centres_mean() {
        let d = gaussian(32, 1.0, 0.05);
        let c = PhaseDensity::contracted(&d, 4).unwrap();
        assert_eq!(c.magnification(), 4);
        assert_eq!(c.order(), 8);
        // The mean sits at the centre of the represented range.
        let theta = wrap_two_pi(-c.harmonic(1).unwrap().arg());
        assert!((theta - PI).abs() < 1e-12);
        assert!((c.phase_estimate().unwrap() - 1.0).abs() < 1e-12);
        assert!((c.offset() - wrap_two_pi(1.0 - PI / 4.0)).abs() < 1e-12);
    }

    #[test]
    fn in_place_contraction_matches() {
        let d = gaussian(32, 2.5, 0.1);
        let expected = PhaseDensity::contracted(&d, 2).unwrap();
        let mut c = d.clone();
        c.contract_in_place(2).unwrap();
        assert_eq!(c.order(), expected.order());
        for n in 0..=c.order() {
            assert!((c.harmonic(n).unwrap() - expected.harmonic(n).unwrap()).norm() < 1e-15);
        }
    }

    #[test]
    fn uniform_expansion_round_trip() {
        let base = gaussian(64, 4.0, 0.08);
        let contracted = PhaseDensity::contracted(&base, 2).unwrap();

        let mut full = PhaseDensity::new(128, 1).unwrap();
        full.expand(&contracted, ExpansionKind::Uniform).unwrap();
        assert_eq!(full.order(), 2 * contracted.order());

        let back = PhaseDensity::contracted(&full, 2).unwrap();
        assert_eq!(back.order(), contracted.order());
        for n in 0..=contracted.order() {
            let diff = back.harmonic(n).unwrap() - contracted.harmonic(n).unwrap();
            assert!(diff.norm() < 1e-12, "n = {}: {}", n, diff);
        }
    }

    #[test]
    fn expansion_requires_multiple() {
        let mut d = PhaseDensity::with_magnification(32, 1, 2, 0.0).unwrap();
        let other = PhaseDensity::with_magnification(32, 1, 3, 0.0).unwrap();
        assert_eq!(
            d.expand(&other, ExpansionKind::Uniform),
            Err(DensityError::InvalidExpansion {
                source: 3,
                target: 2
            })
        );
    }

    #[test]
    fn expansion_checks_range() {
        let mut wide = PhaseDensity::with_magnification(64, 1, 2, 0.0).unwrap();
        let inside = PhaseDensity::with_magnification(16, 1, 4, 0.5).unwrap();
        let outside = PhaseDensity::with_magnification(16, 1, 4, 3.5).unwrap();
        assert_eq!(
            wide.expand(&outside, ExpansionKind::Uniform),
            Err(DensityError::ExpansionOutOfRange)
        );
        assert!(wide.expand(&inside, ExpansionKind::Uniform).is_ok());
        // Coinciding bounds are inside.
        let same = PhaseDensity::with_magnification(16, 1, 2, 0.0).unwrap();
        assert!(wide.expand(&same, ExpansionKind::Uniform).is_ok());
    }

    #[test]
    fn expansion_clamps_to_capacity() {
        let base = gaussian(64, 1.0, 0.05);
        let contracted = PhaseDensity::contracted(&base, 4).unwrap();
        let mut small = PhaseDensity::new(10, 1).unwrap();
        small.expand(&contracted, ExpansionKind::Uniform).unwrap();
        assert_eq!(small.order(), 10);
    }

    #[test]
    fn self_envelope_keeps_both_estimates() {
        // A broad full-range prior fused with a sharp contracted density.
        let mut broad = gaussian(64, 1.0, 0.4);
        let sharp = PhaseDensity::contracted(&gaussian(64, 1.05, 0.1), 2).unwrap();
        broad.expand(&sharp, ExpansionKind::SelfEnvelope).unwrap();
        assert_eq!(broad.harmonic(0).unwrap(), C_ONE);
        let estimate = broad.phase_estimate().unwrap();
        assert!(estimate > 1.0 && estimate < 1.1, "estimate = {}", estimate);
        assert!(broad.variance() < gaussian(64, 1.0, 0.4).variance());
    }

    #[test]
    fn gaussian_envelopes_produce_densities() {
        let sharp = PhaseDensity::contracted(&gaussian(64, 2.0, 0.1), 2).unwrap();
        for kind in [ExpansionKind::Gaussian, ExpansionKind::GaussianSelfMean] {
            let mut d = gaussian(64, 2.0, 0.5);
            d.expand(&sharp, kind).unwrap();
            assert_eq!(d.harmonic(0).unwrap(), C_ONE);
            assert!((d.phase_estimate().unwrap() - 2.0).abs() < 0.1);
        }
    }

    #[test]
    fn gaussian_envelope_width() {
        // A uniform source leaves the envelope itself.
        let source = PhaseDensity::with_magnification(16, 1, 2, 0.0).unwrap();
        let mut d = PhaseDensity::new(64, 1).unwrap();
        d.expand(&source, ExpansionKind::Gaussian).unwrap();
        let width = PI / 3.0;
        for n in 1..=3 {
            let expected = (-2.0 * (n * n) as f64 * width * width).exp();
            assert!((d.harmonic(n).unwrap().norm() - expected).abs() < 1e-12);
        }
        assert!((d.phase_estimate().unwrap() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn set_density_fuses_resolutions() {
        let mut coarse = PhaseDensity::new(64, 4).unwrap();
        coarse.set_gaussian(2.0, 0.3);
        coarse.update(Outcome::Zero, 2.0, 1).unwrap();

        let fine = PhaseDensity::contracted(&gaussian(64, 2.02, 0.05), 2).unwrap();
        coarse.set_density(&fine, 2).unwrap();

        assert_eq!(coarse.magnification(), 2);
        assert_eq!(coarse.k_max(), 1);
        assert!((coarse.phase_estimate().unwrap() - 2.02).abs() < 0.05);
    }

    #[test]
    fn set_density_without_contraction() {
        let mut a = gaussian(64, 0.5, 0.3);
        let b = gaussian(64, 0.6, 0.3);
        a.set_density(&b, 1).unwrap();
        assert_eq!(a.magnification(), 1);
        let estimate = a.phase_estimate().unwrap();
        assert!(estimate > 0.5 && estimate < 0.6);
    }
}
