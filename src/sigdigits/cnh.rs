// Centered Normal Hypothesis estimator

use crate::stats::root_mean_square;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// s = -log2(σ) - δ, with the confidence penalty
///
/// δ = ½·log2((m-1) / χ²_{(1-c)/2, m-1}) + log2(Φ⁻¹((p+1)/2))
///
/// The errors are centered on zero by hypothesis, so σ is their root mean
/// square: a constant offset between the two halves counts as spread.
/// Needs at least two errors, not all zero; returns `None` when σ or the
/// quantile functions cannot be evaluated.
pub(super) fn significant_bits(errors: &[f64], probability: f64, confidence: f64) -> Option<f64> {
    let sigma = root_mean_square(errors.iter().copied());
    if sigma == 0.0 || !sigma.is_finite() {
        return None;
    }

    let dof = (errors.len() - 1) as f64;
    let chi2 = ChiSquared::new(dof).ok()?.inverse_cdf((1.0 - confidence) / 2.0);
    let inorm = Normal::new(0.0, 1.0)
        .ok()?
        .inverse_cdf((probability + 1.0) / 2.0);

    let delta = 0.5 * (dof / chi2).log2() + inorm.log2();
    let bits = -sigma.log2() - delta;

    bits.is_finite().then_some(bits)
}
