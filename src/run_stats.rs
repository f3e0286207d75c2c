//! Per-run statistics
//!
//! Reduces each sample set of a run to one [`RunStatistics`] row: mean,
//! population standard deviation, Shapiro-Wilk p-value, significant digits
//! in base 2 and 10 and the five-number summary.

use crate::config::AnalysisConfig;
use crate::keys::{Dimension, SampleKey};
use crate::normality::shapiro_wilk;
use crate::probes::SampleSets;
use crate::sigdigits::{Estimator, Method, Precision, SignificantDigits};
use crate::stats::{population_std, Distribution};
use crate::store::{Run, RunMetadata};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, warn};

/// Statistics of one (test, variable, backend) sample set in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub test: String,
    pub variable: String,
    pub backend: String,
    pub timestamp: i64,
    pub mu: f64,
    pub sigma: f64,
    /// Shapiro-Wilk p-value, absent below 3 samples
    pub pvalue: Option<f64>,
    pub s_base2: SignificantDigits,
    pub s_base10: SignificantDigits,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
    pub n_samples: usize,
}

impl RunStatistics {
    pub fn key(&self) -> SampleKey {
        SampleKey::new(
            self.test.as_str(),
            self.variable.as_str(),
            self.backend.as_str(),
        )
    }

    /// Value of this row along `dimension`
    pub fn field(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Test => &self.test,
            Dimension::Variable => &self.variable,
            Dimension::Backend => &self.backend,
        }
    }

    pub fn matches(&self, key: &SampleKey) -> bool {
        self.test == key.test && self.variable == key.variable && self.backend == key.backend
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("Sample set {0} is empty")]
    EmptySampleSet(SampleKey),

    #[error("Sample set {key} holds {count} non-finite value(s)")]
    NonFinite { key: SampleKey, count: usize },

    #[error("Statistics of sample set {0} overflow the f64 range")]
    Overflow(SampleKey),
}

/// Computes [`RunStatistics`] rows
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsComputer {
    estimator: Estimator,
    normality_threshold: f64,
}

impl Default for StatisticsComputer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl StatisticsComputer {
    pub fn new(estimator: Estimator, normality_threshold: f64) -> Self {
        Self {
            estimator,
            normality_threshold,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.estimator(), config.normality_threshold)
    }

    /// Statistics of one sample set
    pub fn compute(
        &self,
        key: &SampleKey,
        timestamp: i64,
        samples: &[f64],
    ) -> Result<RunStatistics, StatsError> {
        let non_finite = samples.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            return Err(StatsError::NonFinite {
                key: key.clone(),
                count: non_finite,
            });
        }

        let summary = Distribution::from_values(samples)
            .ok_or_else(|| StatsError::EmptySampleSet(key.clone()))?;
        let mu = summary.mu;
        let sigma = population_std(samples).unwrap_or(0.0);
        let summary_values = [
            mu,
            sigma,
            summary.min,
            summary.q25,
            summary.q50,
            summary.q75,
            summary.max,
        ];
        if summary_values.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::Overflow(key.clone()));
        }

        let pvalue = shapiro_wilk(samples).map(|result| result.pvalue);
        let method = Method::select(pvalue, self.normality_threshold);

        let s_base2 = self.significant_bits(key, samples, mu, method);
        let s_base10 = s_base2.change_base(10.0);

        debug!(
            %key,
            n = samples.len(),
            mu,
            sigma,
            ?pvalue,
            ?method,
            ?s_base2,
            "computed run statistics"
        );

        Ok(RunStatistics {
            test: key.test.clone(),
            variable: key.variable.clone(),
            backend: key.backend.clone(),
            timestamp,
            mu,
            sigma,
            pvalue,
            s_base2,
            s_base10,
            min: summary.min,
            q25: summary.q25,
            q50: summary.q50,
            q75: summary.q75,
            max: summary.max,
            n_samples: samples.len(),
        })
    }

    fn significant_bits(
        &self,
        key: &SampleKey,
        samples: &[f64],
        mu: f64,
        method: Method,
    ) -> SignificantDigits {
        if self.estimator.precision == Precision::Relative && mu == 0.0 {
            return SignificantDigits::Undefined;
        }

        match self.estimator.estimate(&even_sized(samples), None, method) {
            Ok(digits) => digits,
            Err(err) => {
                warn!(%key, error = %err, "significant digits estimate failed");
                SignificantDigits::Undefined
            }
        }
    }

    /// One row per sample set, in key order
    ///
    /// Sample sets that cannot be reduced (non-finite values) are logged and
    /// left out of the run.
    pub fn process_run(&self, sets: &SampleSets, metadata: RunMetadata) -> Run {
        let timestamp = metadata.timestamp;
        let mut statistics = Vec::with_capacity(sets.len());

        for (key, samples) in sets.iter() {
            match self.compute(key, timestamp, samples) {
                Ok(row) => statistics.push(row),
                Err(err) => warn!(error = %err, "skipping sample set"),
            }
        }

        Run {
            metadata,
            statistics,
        }
    }
}

/// Samples made even-sized for pairwise comparison
///
/// An odd-sized set gets its last sample duplicated once.
pub fn even_sized(samples: &[f64]) -> Cow<'_, [f64]> {
    match samples.last() {
        Some(last) if samples.len() % 2 != 0 => {
            let mut padded = samples.to_vec();
            padded.push(*last);
            Cow::Owned(padded)
        }
        _ => Cow::Borrowed(samples),
    }
}
