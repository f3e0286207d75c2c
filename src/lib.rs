//! numrepro - numerical reproducibility statistics for stochastic-arithmetic runs
//!
//! This library turns the raw probe dumps of instrumented numerical tests,
//! executed repeatedly under different perturbation backends, into per-run
//! statistics (mean, spread, normality, significant digits) and re-aggregates
//! those statistics across runs, tests, variables and backends for trend
//! analysis.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod hexfloat;
pub mod json_output;
pub mod keys;
pub mod labels;
pub mod normality;
pub mod outliers;
pub mod probes;
pub mod run_stats;
pub mod sigdigits;
pub mod stats;
pub mod store;
pub mod text_output;
