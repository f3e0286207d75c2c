//! Z-score outlier rejection
//!
//! Used by the aggregator before summarizing a group's values. A value is
//! an outlier when it lies `k` or more population standard deviations from
//! the mean.

use crate::stats::{mean, population_std};

/// Default rejection threshold, in standard deviations
pub const DEFAULT_ZSCORE: f64 = 3.0;

/// Flag every value lying `zscore` or more standard deviations from the mean
///
/// Nothing is flagged for two values or fewer, or when all values are equal.
pub fn outlier_mask(values: &[f64], zscore: f64) -> Vec<bool> {
    if values.len() <= 2 {
        return vec![false; values.len()];
    }

    let (Some(mu), Some(std)) = (mean(values), population_std(values)) else {
        return vec![false; values.len()];
    };
    if std == 0.0 {
        return vec![false; values.len()];
    }

    let bound = zscore * std;
    values.iter().map(|v| (v - mu).abs() >= bound).collect()
}

/// Values that are not outliers, in their original order
pub fn remove_outliers(values: &[f64], zscore: f64) -> Vec<f64> {
    let mask = outlier_mask(values, zscore);
    values
        .iter()
        .zip(mask)
        .filter(|(_, outlier)| !outlier)
        .map(|(v, _)| *v)
        .collect()
}
