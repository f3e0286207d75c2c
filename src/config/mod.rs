// Configuration files
//
// - `numrepro.toml`: analysis policy (normality threshold, outlier
//   rejection, estimator parameters, display-name abbreviation)
// - `vfc_tests_config.json`: the test suite, i.e. which executables run
//   under which backends and how many times

mod analysis;
mod suite;

pub use analysis::{AnalysisConfig, ANALYSIS_CONFIG_FILE};
pub use suite::{BackendConfig, ExecutableConfig, Execution, SuiteConfig, SUITE_CONFIG_FILE};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: file not found. {hint}", path.display())]
    NotFound { path: PathBuf, hint: &'static str },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Read a configuration file, mapping a missing file to `NotFound`
fn read_config_file(path: &Path, hint: &'static str) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
                hint,
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
