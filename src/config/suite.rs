// Test-suite description (`vfc_tests_config.json`)

use super::{read_config_file, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the suite description
pub const SUITE_CONFIG_FILE: &str = "vfc_tests_config.json";

const SUITE_HINT: &str =
    "This file is required to describe the tests to run and generate a run file";

/// Executables of the suite and the backends they run under
///
/// # Example
/// ```
/// use numrepro::config::SuiteConfig;
///
/// let suite = SuiteConfig::from_json_str(r#"{
///     "make_command": "make",
///     "executables": [{
///         "executable": "bin/dot",
///         "vfc_backends": [{ "name": "libinterflop_mca.so", "repetitions": 3 }]
///     }]
/// }"#).unwrap();
/// assert_eq!(suite.executions().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Build command run before the executables
    #[serde(default)]
    pub make_command: String,
    pub executables: Vec<ExecutableConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableConfig {
    pub executable: String,
    #[serde(default)]
    pub parameters: String,
    pub vfc_backends: Vec<BackendConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
}

fn default_repetitions() -> u32 {
    1
}

/// One execution of one executable under one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Position in execution order, names the probe dump
    pub index: usize,
    pub executable: String,
    pub backend: String,
    /// 1-based repetition number
    pub repetition: u32,
}

impl Execution {
    /// Probe dump written by this execution: `<dir>/<index>.csv`
    pub fn probe_file(&self, probes_dir: &Path) -> PathBuf {
        probes_dir.join(format!("{}.csv", self.index))
    }
}

impl SuiteConfig {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_config_file(path, SUITE_HINT)?;
        Self::parse(&content, path)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new(SUITE_CONFIG_FILE))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let suite: Self = serde_json::from_str(content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        suite.validate().map_err(ConfigError::Invalid)?;
        Ok(suite)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.executables.is_empty() {
            return Err("no executables configured".to_string());
        }

        for executable in &self.executables {
            if executable.executable.trim().is_empty() {
                return Err("executable name must not be empty".to_string());
            }
            if executable.vfc_backends.is_empty() {
                return Err(format!(
                    "executable '{}' has no backend",
                    executable.executable
                ));
            }
            if let Some(backend) = executable
                .vfc_backends
                .iter()
                .find(|b| b.name.trim().is_empty())
            {
                return Err(format!(
                    "executable '{}' has a backend without a name (repetitions = {})",
                    executable.executable, backend.repetitions
                ));
            }
        }

        Ok(())
    }

    /// Every execution, in the order the suite runs them
    pub fn executions(&self) -> Vec<Execution> {
        let mut executions = Vec::new();

        for executable in &self.executables {
            for backend in &executable.vfc_backends {
                for repetition in 1..=backend.repetitions {
                    executions.push(Execution {
                        index: executions.len(),
                        executable: executable.executable.clone(),
                        backend: backend.name.clone(),
                        repetition,
                    });
                }
            }
        }

        executions
    }
}
