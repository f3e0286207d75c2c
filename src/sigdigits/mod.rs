// Significant-digits estimation for stochastic-arithmetic samples
//
// A sample set produced under random rounding spreads around the exact
// result; the number of significant digits measures how many leading bits
// all samples agree on. Two estimators are provided:
//
// - CNH (Centered Normal Hypothesis): assumes the errors are normally
//   distributed and derives a bound from their standard deviation, with a
//   chi-square confidence correction for the finite sample size.
// - General: distribution-free; counts the bits on which every observed
//   error vanishes.
//
// Scientific Foundation:
// [1] Sohier, D., De Oliveira Castro, P., Févotte, F., Lathuilière, B.,
//     Petit, E., & Jamond, O. (2021). Confidence intervals for stochastic
//     arithmetic. ACM TOMS 47(2).

mod cnh;
mod general;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use thiserror::Error;
use tracing::debug;

/// Bits of precision of an `f64` significand (including the implicit bit)
pub const MAX_BITS: f64 = 53.0;

/// Outcome of a significant-digits estimate
///
/// `Digits` carries a number expressed in whatever base the value was
/// converted to (base 2 straight out of [`Estimator::estimate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SignificantDigits {
    /// Numeric estimate
    Digits(f64),
    /// No spread observed: every bit of the format is reproducible
    Maximal,
    /// No estimate can be formed (relative error against zero)
    Undefined,
}

impl SignificantDigits {
    /// Convert a base-2 estimate into `base`
    pub fn change_base(self, base: f64) -> Self {
        match self {
            SignificantDigits::Digits(bits) => SignificantDigits::Digits(bits * LN_2 / base.ln()),
            other => other,
        }
    }

    /// Numeric value, with `Maximal` resolved to 53 bits expressed in `base`
    ///
    /// `base` must match the base this value is already expressed in.
    pub fn value(&self, base: f64) -> Option<f64> {
        match self {
            SignificantDigits::Digits(value) => Some(*value),
            SignificantDigits::Maximal => Some(MAX_BITS * LN_2 / base.ln()),
            SignificantDigits::Undefined => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, SignificantDigits::Undefined)
    }
}

/// Estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Centered Normal Hypothesis
    Cnh,
    /// Distribution-free bound
    General,
}

impl Method {
    /// Pick CNH when the data passes a normality test at `threshold`
    ///
    /// Without a p-value (fewer than 3 samples) normality cannot be assumed.
    pub fn select(pvalue: Option<f64>, threshold: f64) -> Self {
        match pvalue {
            Some(p) if p >= threshold => Method::Cnh,
            _ => Method::General,
        }
    }
}

/// Error measure between samples and their reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// z = x - y
    #[default]
    Absolute,
    /// z = x / y - 1
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("no samples to estimate significant digits from")]
    Empty,

    #[error("pairwise comparison needs an even number of samples, got {0}")]
    OddSampleCount(usize),
}

/// Significant-digits estimator
#[derive(Debug, Clone, PartialEq)]
pub struct Estimator {
    pub precision: Precision,
    /// Probability that a sample carries at least the estimated digits
    pub probability: f64,
    /// Confidence level of the CNH bound
    pub confidence: f64,
    /// Shuffle samples with this seed before pairing them
    pub shuffle_seed: Option<u64>,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            precision: Precision::Absolute,
            probability: 0.95,
            confidence: 0.95,
            shuffle_seed: None,
        }
    }
}

impl Estimator {
    /// Estimate significant bits of `samples`
    ///
    /// Without a `reference`, the samples are split in two halves compared
    /// pairwise, so their count must be even.
    pub fn estimate(
        &self,
        samples: &[f64],
        reference: Option<f64>,
        method: Method,
    ) -> Result<SignificantDigits, EstimateError> {
        if samples.is_empty() {
            return Err(EstimateError::Empty);
        }
        if reference.is_none() && samples.len() % 2 != 0 {
            return Err(EstimateError::OddSampleCount(samples.len()));
        }

        let mut samples = samples.to_vec();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            samples.shuffle(&mut rng);
        }

        let Some(errors) = self.errors(&samples, reference) else {
            return Ok(SignificantDigits::Undefined);
        };

        if errors.iter().any(|z| !z.is_finite()) {
            return Ok(SignificantDigits::Undefined);
        }
        if errors.iter().all(|z| *z == 0.0) {
            return Ok(SignificantDigits::Maximal);
        }
        if errors.len() < 2 {
            debug!(
                differences = errors.len(),
                "too few differences for a bound, reporting zero digits"
            );
            return Ok(SignificantDigits::Digits(0.0));
        }

        let bits = match method {
            Method::Cnh => cnh::significant_bits(&errors, self.probability, self.confidence),
            Method::General => Some(general::significant_bits(&errors)),
        };

        Ok(bits.map_or(SignificantDigits::Undefined, SignificantDigits::Digits))
    }

    /// Errors against the reference; `None` on a zero divisor
    fn errors(&self, samples: &[f64], reference: Option<f64>) -> Option<Vec<f64>> {
        let pairs: Vec<(f64, f64)> = match reference {
            Some(r) => samples.iter().map(|x| (*x, r)).collect(),
            None => {
                let (x, y) = samples.split_at(samples.len() / 2);
                x.iter().copied().zip(y.iter().copied()).collect()
            }
        };

        match self.precision {
            Precision::Absolute => Some(pairs.iter().map(|(x, y)| x - y).collect()),
            Precision::Relative => pairs
                .iter()
                .map(|(x, y)| if *y == 0.0 { None } else { Some(x / y - 1.0) })
                .collect(),
        }
    }
}
