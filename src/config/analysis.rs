// Analysis policy
//
// Every statistical knob of the engine lives here so a project can tune it
// in `numrepro.toml` instead of relying on constants.

use super::{read_config_file, ConfigError};
use crate::sigdigits::{Estimator, Precision};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name looked up next to the test suite
pub const ANALYSIS_CONFIG_FILE: &str = "numrepro.toml";

/// Analysis policy
///
/// # Example
/// ```
/// use numrepro::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.normality_threshold, 0.05);
/// assert_eq!(config.outlier_zscore, 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Shapiro-Wilk p-value below which samples are treated as non-normal
    /// and the distribution-free estimator is used
    pub normality_threshold: f64,

    /// Z-score beyond which aggregated values are rejected as outliers
    pub outlier_zscore: f64,

    /// Reject outliers in aggregated views by default
    pub remove_outliers: bool,

    /// Probability that a sample carries at least the estimated digits
    pub probability: f64,

    /// Confidence level of the CNH bound
    pub confidence: f64,

    /// Error measure used by the significant-digits estimator
    pub precision: Precision,

    /// Shuffle samples with this seed before pairing (no shuffling if unset)
    pub shuffle_seed: Option<u64>,

    /// Group keys longer than this are abbreviated for display
    pub label_max_len: usize,

    /// Characters kept on each side of an abbreviated key
    pub label_keep: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            normality_threshold: 0.05,
            outlier_zscore: 3.0,
            remove_outliers: true,
            probability: 0.95,
            confidence: 0.95,
            precision: Precision::Absolute,
            shuffle_seed: None,
            label_max_len: 25,
            label_keep: 10,
        }
    }
}

impl AnalysisConfig {
    /// Stricter normality requirement and tighter outlier rejection
    pub fn strict() -> Self {
        Self {
            normality_threshold: 0.01,
            outlier_zscore: 2.5,
            ..Self::default()
        }
    }

    /// Looser normality requirement and only extreme outliers rejected
    pub fn permissive() -> Self {
        Self {
            normality_threshold: 0.10,
            outlier_zscore: 4.0,
            ..Self::default()
        }
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_config_file(path, "Pass an existing analysis configuration file")?;
        let config = Self::from_toml_str(&content).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse {
            path: PathBuf::from(ANALYSIS_CONFIG_FILE),
            message: err.to_string(),
        })?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Explicit file if given, otherwise defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Significant-digits estimator configured by this policy
    pub fn estimator(&self) -> Estimator {
        Estimator {
            precision: self.precision,
            probability: self.probability,
            confidence: self.confidence,
            shuffle_seed: self.shuffle_seed,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.normality_threshold) {
            return Err(format!(
                "normality_threshold must be in [0, 1], got {}",
                self.normality_threshold
            ));
        }

        if self.outlier_zscore.is_nan() || self.outlier_zscore <= 0.0 {
            return Err(format!(
                "outlier_zscore must be positive, got {}",
                self.outlier_zscore
            ));
        }

        for (name, value) in [
            ("probability", self.probability),
            ("confidence", self.confidence),
        ] {
            if value.is_nan() || value <= 0.0 || value >= 1.0 {
                return Err(format!("{name} must be in (0, 1), got {value}"));
            }
        }

        if self.label_max_len < 2 * self.label_keep + 3 {
            return Err(format!(
                "label_max_len ({}) must leave room for two {}-character ends and \"...\"",
                self.label_max_len, self.label_keep
            ));
        }

        Ok(())
    }
}
