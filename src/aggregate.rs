//! Cross-run aggregation
//!
//! Re-aggregates [`RunStatistics`] rows along one dimension (test, variable
//! or backend). Each group gets a sample-weighted mean and fresh
//! distributions of the members' sigma and significant digits, optionally
//! after z-score outlier rejection.

use crate::config::AnalysisConfig;
use crate::keys::Dimension;
use crate::labels::abbreviate;
use crate::outliers::{remove_outliers, DEFAULT_ZSCORE};
use crate::run_stats::RunStatistics;
use crate::stats::{mean, sorted_copy, Distribution};
use crate::store::RunStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Options of an aggregated view
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub remove_outliers: bool,
    /// Outlier threshold in standard deviations
    pub zscore: f64,
    /// Keys longer than this get an abbreviated display form
    pub label_max_len: usize,
    /// Characters kept on each side of an abbreviated key
    pub label_keep: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            remove_outliers: true,
            zscore: DEFAULT_ZSCORE,
            label_max_len: 25,
            label_keep: 10,
        }
    }
}

impl From<&AnalysisConfig> for AggregateOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            remove_outliers: config.remove_outliers,
            zscore: config.outlier_zscore,
            label_max_len: config.label_max_len,
            label_keep: config.label_keep,
        }
    }
}

/// Summary of the rows sharing one value along the grouping dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedGroup {
    pub key: String,
    /// `key`, abbreviated when too long to display
    pub display_key: String,
    /// Mean of member means weighted by their sample counts
    pub mu: f64,
    /// Number of member rows
    pub n_samples: usize,
    pub sigma: Distribution,
    /// Absent when no member has a numeric estimate
    pub s_base10: Option<Distribution>,
    pub s_base2: Option<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("Cannot group by '{0}' while filtering on it")]
    SameDimension(Dimension),

    #[error("No run with timestamp {0}")]
    UnknownRun(i64),
}

/// Σ mu_i·n_i / Σ n_i; `None` when the weights sum to zero
pub fn weighted_mean<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, usize)>,
{
    let (sum, weight) = pairs
        .into_iter()
        .fold((0.0, 0usize), |(sum, weight), (mu, n)| {
            (sum + mu * n as f64, weight + n)
        });

    (weight > 0).then(|| sum / weight as f64)
}

/// Group `rows` by `group_by` and summarize each group, ordered by key
pub fn aggregate<'a, I>(rows: I, group_by: Dimension, options: &AggregateOptions) -> Vec<AggregatedGroup>
where
    I: IntoIterator<Item = &'a RunStatistics>,
{
    let mut groups: BTreeMap<&str, Vec<&RunStatistics>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.field(group_by)).or_default().push(row);
    }

    groups
        .into_iter()
        .filter_map(|(key, members)| summarize_group(key, &members, options))
        .collect()
}

fn summarize_group(
    key: &str,
    members: &[&RunStatistics],
    options: &AggregateOptions,
) -> Option<AggregatedGroup> {
    let means: Vec<f64> = members.iter().map(|row| row.mu).collect();
    let mu = weighted_mean(members.iter().map(|row| (row.mu, row.n_samples)))
        .or_else(|| mean(&means))?;

    let sigmas: Vec<f64> = members.iter().map(|row| row.sigma).collect();
    let s_base10: Vec<f64> = members
        .iter()
        .filter_map(|row| row.s_base10.value(10.0))
        .collect();
    let s_base2: Vec<f64> = members
        .iter()
        .filter_map(|row| row.s_base2.value(2.0))
        .collect();

    debug!(
        key,
        members = members.len(),
        numeric_digits = s_base2.len(),
        "aggregating group"
    );

    Some(AggregatedGroup {
        key: key.to_string(),
        display_key: abbreviate(key, options.label_max_len, options.label_keep).into_owned(),
        mu,
        n_samples: members.len(),
        sigma: distribution(&sigmas, options)?,
        s_base10: distribution(&s_base10, options),
        s_base2: distribution(&s_base2, options),
    })
}

/// Sort, optionally drop outliers, then summarize
fn distribution(values: &[f64], options: &AggregateOptions) -> Option<Distribution> {
    let sorted = sorted_copy(values);
    if options.remove_outliers {
        let kept = remove_outliers(&sorted, options.zscore);
        if kept.len() < sorted.len() {
            debug!(
                removed = sorted.len() - kept.len(),
                "rejected outliers"
            );
        }
        // A threshold below 1 can reject every value
        if !kept.is_empty() {
            return Distribution::from_sorted(&kept);
        }
    }
    Distribution::from_sorted(&sorted)
}

/// Aggregate the rows of one run whose `filter_dim` equals `filter_value`
pub fn aggregate_view(
    store: &RunStore,
    run: i64,
    filter_dim: Dimension,
    filter_value: &str,
    group_by: Dimension,
    options: &AggregateOptions,
) -> Result<Vec<AggregatedGroup>, AggregateError> {
    if group_by == filter_dim {
        return Err(AggregateError::SameDimension(group_by));
    }

    let rows = store.run_rows(run).ok_or(AggregateError::UnknownRun(run))?;
    let selected = rows
        .iter()
        .filter(|row| row.field(filter_dim) == filter_value);

    Ok(aggregate(selected, group_by, options))
}
