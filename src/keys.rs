//! Identity of a sample set and the dimensions runs are sliced along

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three configuration axes every statistic is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Test name (first half of the probe key)
    Test,
    /// Measured variable (second half of the probe key)
    Variable,
    /// Perturbation backend the executable ran under
    #[serde(alias = "vfc_backend")]
    Backend,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Test, Dimension::Variable, Dimension::Backend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Test => "test",
            Dimension::Variable => "variable",
            Dimension::Backend => "backend",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dimension '{0}' (expected test, variable or backend)")]
pub struct ParseDimensionError(pub String);

impl FromStr for Dimension {
    type Err = ParseDimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Dimension::Test),
            "variable" | "var" => Ok(Dimension::Variable),
            "backend" | "vfc_backend" => Ok(Dimension::Backend),
            other => Err(ParseDimensionError(other.to_string())),
        }
    }
}

/// (test, variable, backend) triple identifying one sample set within a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleKey {
    pub test: String,
    pub variable: String,
    pub backend: String,
}

impl SampleKey {
    pub fn new(
        test: impl Into<String>,
        variable: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            test: test.into(),
            variable: variable.into(),
            backend: backend.into(),
        }
    }

    /// Value of this key along `dimension`
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Test => &self.test,
            Dimension::Variable => &self.variable,
            Dimension::Backend => &self.backend,
        }
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.test, self.variable, self.backend)
    }
}
