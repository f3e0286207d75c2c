//! JSON output format for runs and their views
//!
//! Every document carries the crate version and a format name so readers can
//! reject files they do not understand. A run file (`numrepro-run-v1`) is
//! also the input of the aggregation and series views.

use crate::aggregate::AggregatedGroup;
use crate::keys::{Dimension, SampleKey};
use crate::labels::{unix_now, RunLabeler};
use crate::probes::{ExecutionWarning, SampleSets};
use crate::run_stats::RunStatistics;
use crate::store::{Run, RunMetadata, RunStore, SeriesPoint};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const RUN_FORMAT: &str = "numrepro-run-v1";
pub const RAW_FORMAT: &str = "numrepro-raw-v1";
pub const AGGREGATE_FORMAT: &str = "numrepro-aggregate-v1";
pub const SERIES_FORMAT: &str = "numrepro-series-v1";

fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// A processed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRun {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub metadata: RunMetadata,
    pub statistics: Vec<RunStatistics>,
    /// Executions that produced no data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExecutionWarning>,
}

impl JsonRun {
    pub fn new(run: &Run, warnings: &[ExecutionWarning]) -> Self {
        Self {
            version: version(),
            format: RUN_FORMAT.to_string(),
            metadata: run.metadata.clone(),
            statistics: run.statistics.clone(),
            warnings: warnings.to_vec(),
        }
    }

    pub fn into_run(self) -> Run {
        Run {
            metadata: self.metadata,
            statistics: self.statistics,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Raw samples of a run, values as hex-float literals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRawRun {
    pub version: String,
    pub format: String,
    pub metadata: RunMetadata,
    pub samples: SampleSets,
}

impl JsonRawRun {
    pub fn new(metadata: &RunMetadata, samples: &SampleSets) -> Self {
        Self {
            version: version(),
            format: RAW_FORMAT.to_string(),
            metadata: metadata.clone(),
            samples: samples.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Selection an aggregated view was computed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFilter {
    pub dimension: Dimension,
    pub value: String,
}

/// An aggregated view of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAggregate {
    pub version: String,
    pub format: String,
    /// Timestamp of the aggregated run
    pub run: i64,
    pub filter: JsonFilter,
    pub group_by: Dimension,
    pub outliers_removed: bool,
    pub groups: Vec<AggregatedGroup>,
}

impl JsonAggregate {
    pub fn new(
        run: i64,
        filter: JsonFilter,
        group_by: Dimension,
        outliers_removed: bool,
        groups: Vec<AggregatedGroup>,
    ) -> Self {
        Self {
            version: version(),
            format: AGGREGATE_FORMAT.to_string(),
            run,
            filter,
            group_by,
            outliers_removed,
            groups,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Per-run series of one (test, variable, backend)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSeries {
    pub version: String,
    pub format: String,
    pub key: SampleKey,
    pub points: Vec<SeriesPoint>,
}

impl JsonSeries {
    pub fn new(key: SampleKey, points: Vec<SeriesPoint>) -> Self {
        Self {
            version: version(),
            format: SERIES_FORMAT.to_string(),
            key,
            points,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a run document
pub fn parse_run(content: &str) -> Result<Run> {
    let document: JsonRun = serde_json::from_str(content).context("Failed to parse run JSON")?;
    if document.format != RUN_FORMAT {
        bail!(
            "Unsupported run format '{}' (expected '{}')",
            document.format,
            RUN_FORMAT
        );
    }
    Ok(document.into_run())
}

/// Load a run file written by `numrepro process`
pub fn load_run_file<P: AsRef<Path>>(path: P) -> Result<Run> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run file: {}", path.display()))?;
    parse_run(&content).with_context(|| format!("Invalid run file: {}", path.display()))
}

/// Load several run files into one store
///
/// Every run gets its display name as seen at `now`.
pub fn load_store_at<P: AsRef<Path>>(paths: &[P], now: i64) -> Result<RunStore> {
    let mut store = RunStore::new();
    for path in paths {
        let run = load_run_file(path)?;
        store
            .add_run(run)
            .with_context(|| format!("Cannot add {}", path.as_ref().display()))?;
    }
    store.assign_display_names(&mut RunLabeler::new(), now);
    Ok(store)
}

/// [`load_store_at`] against the system clock
pub fn load_store<P: AsRef<Path>>(paths: &[P]) -> Result<RunStore> {
    load_store_at(paths, unix_now())
}
