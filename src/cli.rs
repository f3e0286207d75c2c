//! CLI argument parsing for numrepro

use crate::keys::{Dimension, SampleKey};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for runs and views
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format for machine parsing (default)
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
    /// Human-readable text format
    Text,
}

/// `dimension=value` selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionFilter {
    pub dimension: Dimension,
    pub value: String,
}

impl FromStr for DimensionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dimension, value) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected DIMENSION=VALUE, got '{s}'"))?;
        let dimension = dimension.trim().parse().map_err(|e| format!("{e}"))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("Empty value in filter '{s}'"));
        }
        Ok(Self {
            dimension,
            value: value.to_string(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(name = "numrepro")]
#[command(version)]
#[command(
    about = "Reproducibility statistics for stochastic-arithmetic test runs",
    long_about = None
)]
pub struct Cli {
    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    /// Analysis settings (TOML); defaults apply when omitted
    #[arg(long = "analysis-config", value_name = "FILE", global = true)]
    pub analysis_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the statistics of one run from the probe dumps of its executions
    Process(ProcessArgs),
    /// Aggregate the statistics of one stored run along a dimension
    Aggregate(AggregateArgs),
    /// Show one sample set across stored runs, oldest first
    Series(SeriesArgs),
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Test suite description (JSON)
    #[arg(long = "config", value_name = "FILE", default_value = "vfc_tests_config.json")]
    pub config: PathBuf,

    /// Directory holding one `<index>.csv` probe dump per execution
    #[arg(long = "probes-dir", value_name = "DIR", default_value = ".vfcruns.tmp")]
    pub probes_dir: PathBuf,

    /// Run timestamp in seconds since the epoch (default: now)
    #[arg(long = "timestamp", value_name = "SECS")]
    pub timestamp: Option<i64>,

    /// Commit hash; marks the run as a git commit
    #[arg(long = "hash", value_name = "HASH")]
    pub hash: Option<String>,

    /// Commit author
    #[arg(long = "author", value_name = "AUTHOR", requires = "hash")]
    pub author: Option<String>,

    /// Commit message
    #[arg(long = "message", value_name = "MESSAGE", requires = "hash")]
    pub message: Option<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write the run here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also export the raw samples (hex floats, JSON) to this file
    #[arg(long = "export-raw", value_name = "FILE")]
    pub export_raw: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Run files written by `numrepro process`
    #[arg(long = "runs", value_name = "FILE", num_args = 1.., required = true)]
    pub runs: Vec<PathBuf>,

    /// Timestamp of the run to aggregate (default: latest)
    #[arg(long = "run", value_name = "TIMESTAMP")]
    pub run: Option<i64>,

    /// Rows to keep, e.g. backend=libinterflop_mca.so
    #[arg(long = "filter", value_name = "DIMENSION=VALUE")]
    pub filter: DimensionFilter,

    /// Dimension to group the selected rows by
    #[arg(long = "group-by", value_name = "DIMENSION")]
    pub group_by: Dimension,

    /// Summarize every member, outliers included
    #[arg(long = "keep-outliers")]
    pub keep_outliers: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SeriesArgs {
    /// Run files written by `numrepro process`
    #[arg(long = "runs", value_name = "FILE", num_args = 1.., required = true)]
    pub runs: Vec<PathBuf>,

    #[arg(long = "test")]
    pub test: String,

    #[arg(long = "variable")]
    pub variable: String,

    #[arg(long = "backend")]
    pub backend: String,

    /// Keep only the N most recent runs (0 keeps all)
    #[arg(long = "last", value_name = "N", default_value = "0")]
    pub last: usize,

    /// Drop runs whose max is a z-score outlier (threshold from the analysis config)
    #[arg(long = "remove-outliers")]
    pub remove_outliers: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,
}

impl SeriesArgs {
    pub fn key(&self) -> SampleKey {
        SampleKey::new(&self.test, &self.variable, &self.backend)
    }
}
