//! Run records
//!
//! A [`RunStore`] holds every processed run, keyed by timestamp. It is an
//! explicit object handed to the aggregation and series views by reference;
//! loading and saving runs is up to the caller.

use crate::keys::{Dimension, SampleKey};
use crate::labels::RunLabeler;
use crate::outliers::outlier_mask;
use crate::run_stats::RunStatistics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Provenance of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Seconds since the Unix epoch, unique per run
    pub timestamp: i64,
    pub is_git_commit: bool,
    pub hash: String,
    pub author: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl RunMetadata {
    /// Run not tied to a commit
    pub fn untracked(timestamp: i64) -> Self {
        Self {
            timestamp,
            is_git_commit: false,
            hash: String::new(),
            author: String::new(),
            message: String::new(),
            display_name: None,
        }
    }

    /// Run of a commit
    pub fn commit(
        timestamp: i64,
        hash: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            is_git_commit: true,
            hash: hash.into(),
            author: author.into(),
            message: message.into(),
            display_name: None,
        }
    }

    /// Commit hash, if any
    pub fn hash(&self) -> Option<&str> {
        Some(self.hash.as_str()).filter(|h| !h.is_empty())
    }

    /// Name assigned by [`RunStore::assign_display_names`]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// One processed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub metadata: RunMetadata,
    pub statistics: Vec<RunStatistics>,
}

/// One run on the chronological axis of a (test, variable, backend) series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(flatten)]
    pub statistics: RunStatistics,
    pub label: String,
    pub is_git_commit: bool,
    pub hash: String,
    pub author: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("A run with timestamp {0} is already stored")]
    DuplicateRun(i64),

    #[error("Run {run} holds a row stamped {row}")]
    MismatchedTimestamp { run: i64, row: i64 },
}

/// Processed runs, ordered by timestamp
#[derive(Debug, Clone, Default)]
pub struct RunStore {
    runs: BTreeMap<i64, Run>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_runs(runs: impl IntoIterator<Item = Run>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for run in runs {
            store.add_run(run)?;
        }
        Ok(store)
    }

    /// Store a run; every row must carry the run's timestamp
    pub fn add_run(&mut self, run: Run) -> Result<(), StoreError> {
        let timestamp = run.metadata.timestamp;
        if self.runs.contains_key(&timestamp) {
            return Err(StoreError::DuplicateRun(timestamp));
        }
        if let Some(row) = run.statistics.iter().find(|r| r.timestamp != timestamp) {
            return Err(StoreError::MismatchedTimestamp {
                run: timestamp,
                row: row.timestamp,
            });
        }

        self.runs.insert(timestamp, run);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Run timestamps, oldest first
    pub fn timestamps(&self) -> Vec<i64> {
        self.runs.keys().copied().collect()
    }

    /// Most recent run
    pub fn latest(&self) -> Option<i64> {
        self.runs.keys().next_back().copied()
    }

    pub fn run(&self, timestamp: i64) -> Option<&Run> {
        self.runs.get(&timestamp)
    }

    pub fn metadata(&self, timestamp: i64) -> Option<&RunMetadata> {
        self.runs.get(&timestamp).map(|run| &run.metadata)
    }

    /// Every row of every run, oldest run first
    pub fn rows(&self) -> impl Iterator<Item = &RunStatistics> {
        self.runs.values().flat_map(|run| run.statistics.iter())
    }

    /// Rows of one run
    pub fn run_rows(&self, timestamp: i64) -> Option<&[RunStatistics]> {
        self.runs
            .get(&timestamp)
            .map(|run| run.statistics.as_slice())
    }

    /// Sorted distinct values along `dimension`, in one run or all of them
    pub fn distinct(&self, dimension: Dimension, run: Option<i64>) -> Vec<String> {
        let values: BTreeSet<&str> = match run {
            Some(timestamp) => self
                .run_rows(timestamp)
                .unwrap_or_default()
                .iter()
                .map(|row| row.field(dimension))
                .collect(),
            None => self.rows().map(|row| row.field(dimension)).collect(),
        };
        values.into_iter().map(str::to_string).collect()
    }

    /// Rows of one (test, variable, backend) across runs, oldest first
    pub fn series_rows(&self, key: &SampleKey) -> Vec<&RunStatistics> {
        self.rows().filter(|row| row.matches(key)).collect()
    }

    /// Label every run, oldest first, with one labeler sequence
    fn labels(&self, labeler: &mut RunLabeler, now: i64) -> BTreeMap<i64, String> {
        labeler.reset();
        self.runs
            .iter()
            .map(|(timestamp, run)| {
                let label = labeler.label(*timestamp, run.metadata.hash(), now);
                (*timestamp, label)
            })
            .collect()
    }

    /// Give every run its display name, as seen at `now`
    pub fn assign_display_names(&mut self, labeler: &mut RunLabeler, now: i64) {
        let mut labels = self.labels(labeler, now);
        for (timestamp, run) in self.runs.iter_mut() {
            run.metadata.display_name = labels.remove(timestamp);
        }
    }

    /// Chronological series of one (test, variable, backend)
    ///
    /// Keeps the `last_n` most recent runs; 0 keeps them all. With an
    /// `outlier_zscore`, runs whose `max` is an outlier among the kept runs
    /// are dropped. Labels are computed over every stored run so they match
    /// the names other views show.
    pub fn run_series(
        &self,
        key: &SampleKey,
        last_n: usize,
        outlier_zscore: Option<f64>,
        labeler: &mut RunLabeler,
        now: i64,
    ) -> Vec<SeriesPoint> {
        let labels = self.labels(labeler, now);
        let rows = self.series_rows(key);
        let skip = match last_n {
            0 => 0,
            n => rows.len().saturating_sub(n),
        };
        let rows = &rows[skip..];

        let maxima: Vec<f64> = rows.iter().map(|row| row.max).collect();
        let outliers = match outlier_zscore {
            Some(zscore) => outlier_mask(&maxima, zscore),
            None => vec![false; rows.len()],
        };

        rows.iter()
            .copied()
            .zip(outliers)
            .filter(|(_, outlier)| !outlier)
            .filter_map(|(row, _)| {
                let metadata = self.metadata(row.timestamp)?;
                Some(SeriesPoint {
                    statistics: row.clone(),
                    label: labels.get(&row.timestamp).cloned().unwrap_or_default(),
                    is_git_commit: metadata.is_git_commit,
                    hash: metadata.hash.clone(),
                    author: metadata.author.clone(),
                    message: metadata.message.clone(),
                })
            })
            .collect()
    }
}
