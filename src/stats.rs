//! Descriptive statistics shared by the per-run computer and the aggregator
//!
//! Every quantile in the crate uses the same convention: linear
//! interpolation between closest ranks on the sorted array (`h = (n-1)·q`),
//! the default of NumPy and R type 7.

use serde::{Deserialize, Serialize};

/// Five-number summary plus mean of a numeric array
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
    pub mu: f64,
}

impl Distribution {
    /// Summarize `values` (any order). `None` for an empty array.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        Self::from_sorted(&sorted)
    }

    /// Summarize an array already sorted ascending
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let (first, last) = (sorted.first()?, sorted.last()?);
        Some(Self {
            min: *first,
            q25: quantile_sorted(sorted, 0.25)?,
            q50: quantile_sorted(sorted, 0.50)?,
            q75: quantile_sorted(sorted, 0.75)?,
            max: *last,
            mu: mean(sorted)?,
        })
    }
}

/// Arithmetic mean
///
/// Falls back to summing `v / n` when the plain sum overflows, so finite
/// input near `f64::MAX` keeps a finite mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mu = values.iter().sum::<f64>() / n;
    if mu.is_finite() {
        return Some(mu);
    }
    Some(values.iter().map(|v| v / n).sum())
}

/// Population standard deviation (denominator n)
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    let std = (sum_sq / values.len() as f64).sqrt();
    if std.is_finite() {
        return Some(std);
    }

    // Squares overflowed: scale deviations by the largest one
    let scale = values.iter().map(|v| (v - mu).abs()).fold(0.0, f64::max);
    Some(scale * root_mean_square(values.iter().map(|v| (v - mu) / scale)))
}

/// `sqrt(mean(v²))`, computed on values scaled by their largest magnitude
pub fn root_mean_square<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = values.into_iter().collect();
    let scale = values.iter().map(|v| v.abs()).fold(0.0, f64::max);
    if values.is_empty() || scale == 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v / scale) * (v / scale)).sum();
    scale * (sum_sq / values.len() as f64).sqrt()
}

/// Copy of `values` sorted ascending (total order, NaN last)
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile `q` in [0, 1] of an ascending array
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    let h = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;

    if lower == upper {
        return Some(sorted[lower]);
    }

    let (a, b) = (sorted[lower], sorted[upper]);
    let weight = h - lower as f64;
    // Rounding in a + (b - a)·w must not escape [a, b]
    Some((a + (b - a) * weight).max(a).min(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(population_std(&values), Some(2.0));
    }

    #[test]
    fn test_mean_near_max_stays_finite() {
        assert_eq!(mean(&[f64::MAX; 4]), Some(f64::MAX));
        assert_eq!(population_std(&[f64::MAX; 4]), Some(0.0));

        let std = population_std(&[f64::MAX, -f64::MAX]).unwrap();
        assert_eq!(std, f64::MAX);
    }

    #[test]
    fn test_root_mean_square() {
        assert_eq!(root_mean_square([3.0, -3.0]), 3.0);
        assert_eq!(root_mean_square([0.0, 0.0]), 0.0);
        assert_eq!(root_mean_square(Vec::new()), 0.0);
        assert!((root_mean_square([1.0, 7.0]) - 5.0).abs() < 1e-15);
        assert_eq!(root_mean_square([1e300, 1e300]), 1e300);
    }

    #[test]
    fn test_std_uses_population_denominator() {
        // Sample std (n-1) would be sqrt(2) here
        let std = population_std(&[1.0, 3.0]).unwrap();
        assert!((std - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std(&[]), None);
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(Distribution::from_values(&[]), None);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile_sorted(&sorted, 1.0), Some(4.0));
    }

    #[test]
    fn test_quantile_odd_length_hits_ranks() {
        let sorted = [1.0, 3.0, 5.0, 7.0, 9.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(3.0));
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(5.0));
        assert_eq!(quantile_sorted(&sorted, 0.75), Some(7.0));
    }

    #[test]
    fn test_distribution_single_point() {
        let dist = Distribution::from_values(&[4.2]).unwrap();
        assert_eq!(dist.min, 4.2);
        assert_eq!(dist.q25, 4.2);
        assert_eq!(dist.q50, 4.2);
        assert_eq!(dist.q75, 4.2);
        assert_eq!(dist.max, 4.2);
        assert_eq!(dist.mu, 4.2);
    }

    #[test]
    fn test_distribution_sorts_input() {
        let dist = Distribution::from_values(&[9.0, 1.0, 5.0, 3.0, 7.0]).unwrap();
        assert_eq!(dist.min, 1.0);
        assert_eq!(dist.q50, 5.0);
        assert_eq!(dist.max, 9.0);
        assert_eq!(dist.mu, 5.0);
    }
}
