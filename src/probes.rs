//! Probe dumps and sample-set assembly
//!
//! Every execution of an instrumented test dumps its probes to a CSV file,
//! one record per measured value:
//!
//! ```text
//! test,variable,value
//! dot_product,result,0x1.999999999999ap-4
//! ```
//!
//! The composite layout `test:variable,value` is also accepted. Values from
//! all repetitions of all executables are merged per (test, variable,
//! backend) into one sample set per run.

use crate::config::Execution;
use crate::hexfloat::{format_hex_f64, parse_sample, HexFloatError};
use crate::keys::SampleKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Raw samples of one run, keyed by (test, variable, backend)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<RawSampleSet>", try_from = "Vec<RawSampleSet>")]
pub struct SampleSets {
    sets: BTreeMap<SampleKey, Vec<f64>>,
}

impl SampleSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample, keeping arrival order within the key
    pub fn push(&mut self, key: SampleKey, value: f64) {
        self.sets.entry(key).or_default().push(value);
    }

    pub fn extend(&mut self, key: SampleKey, values: impl IntoIterator<Item = f64>) {
        self.sets.entry(key).or_default().extend(values);
    }

    pub fn get(&self, key: &SampleKey) -> Option<&[f64]> {
        self.sets.get(key).map(Vec::as_slice)
    }

    /// Sample sets in key order
    pub fn iter(&self) -> impl Iterator<Item = (&SampleKey, &[f64])> {
        self.sets.iter().map(|(key, values)| (key, values.as_slice()))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total number of samples across all keys
    pub fn sample_count(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }
}

impl FromIterator<(SampleKey, Vec<f64>)> for SampleSets {
    fn from_iter<I: IntoIterator<Item = (SampleKey, Vec<f64>)>>(iter: I) -> Self {
        let mut sets = SampleSets::new();
        for (key, values) in iter {
            sets.extend(key, values);
        }
        sets
    }
}

/// Serialized form of one sample set, values as bit-exact hex literals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSampleSet {
    #[serde(flatten)]
    pub key: SampleKey,
    pub values: Vec<String>,
}

impl From<SampleSets> for Vec<RawSampleSet> {
    fn from(sets: SampleSets) -> Self {
        sets.sets
            .into_iter()
            .map(|(key, values)| RawSampleSet {
                key,
                values: values.into_iter().map(format_hex_f64).collect(),
            })
            .collect()
    }
}

impl TryFrom<Vec<RawSampleSet>> for SampleSets {
    type Error = HexFloatError;

    fn try_from(raw: Vec<RawSampleSet>) -> Result<Self, Self::Error> {
        let mut sets = SampleSets::new();
        for entry in raw {
            let values = entry
                .values
                .iter()
                .map(|v| parse_sample(v))
                .collect::<Result<Vec<_>, _>>()?;
            sets.extend(entry.key, values);
        }
        Ok(sets)
    }
}

/// One decoded probe record
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub test: String,
    pub variable: String,
    pub value: f64,
}

/// Records of one probe dump
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProbes {
    pub records: Vec<ProbeRecord>,
    /// Malformed records that were dropped
    pub skipped: usize,
}

/// Decode a probe dump
///
/// A leading header line is recognized by its last column being `value`.
/// Malformed records are counted in [`ParsedProbes::skipped`] and do not
/// abort the parse.
pub fn parse_probe_csv(text: &str) -> ParsedProbes {
    let mut parsed = ParsedProbes::default();
    let mut first = true;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if std::mem::take(&mut first) && is_header(&fields) {
            continue;
        }

        match parse_record(&fields) {
            Some(record) => parsed.records.push(record),
            None => {
                debug!(line, "skipping malformed probe record");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

fn is_header(fields: &[&str]) -> bool {
    fields
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case("value"))
}

fn parse_record(fields: &[&str]) -> Option<ProbeRecord> {
    let (test, variable, value) = match *fields {
        [test, variable, value] => (test, variable, value),
        [key, value] => {
            let (test, variable) = key.split_once(':')?;
            (test, variable, value)
        }
        _ => return None,
    };

    if test.is_empty() || variable.is_empty() {
        return None;
    }

    Some(ProbeRecord {
        test: test.to_string(),
        variable: variable.to_string(),
        value: parse_sample(value).ok()?,
    })
}

/// Why an execution contributed no samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No probe dump at all
    Missing,
    /// Dump present but not readable as text
    Unreadable,
    /// Dump without a single valid record
    Empty,
}

impl WarningKind {
    pub fn description(&self) -> &'static str {
        match self {
            WarningKind::Missing => {
                "probes not found, the code might have crashed or never called vfc_dump_probes"
            }
            WarningKind::Unreadable => "probes could not be read",
            WarningKind::Empty => "probes empty, they were dumped without any vfc_put_probe",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// An execution that produced no data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionWarning {
    pub executable: String,
    pub backend: String,
    pub repetition: u32,
    pub kind: WarningKind,
}

/// Read and decode one probe dump
pub fn read_probe_file(path: &Path) -> Result<ParsedProbes, WarningKind> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_probe_csv(&text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(WarningKind::Missing),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "failed to read probe dump");
            Err(WarningKind::Unreadable)
        }
    }
}

/// Merges the probe dumps of every execution of a run
#[derive(Debug, Default)]
pub struct SampleSetBuilder {
    sets: SampleSets,
    warnings: Vec<ExecutionWarning>,
}

impl SampleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the dump of `execution` found at `path`
    pub fn add_probe_file(&mut self, execution: &Execution, path: &Path) {
        match read_probe_file(path) {
            Ok(parsed) => self.add_parsed(execution, parsed),
            Err(kind) => self.warn(execution, kind),
        }
    }

    /// Add a dump already loaded as text
    pub fn add_probe_text(&mut self, execution: &Execution, text: &str) {
        self.add_parsed(execution, parse_probe_csv(text));
    }

    fn add_parsed(&mut self, execution: &Execution, parsed: ParsedProbes) {
        if parsed.skipped > 0 {
            debug!(
                executable = %execution.executable,
                repetition = execution.repetition,
                skipped = parsed.skipped,
                "dropped malformed probe records"
            );
        }

        if parsed.records.is_empty() {
            self.warn(execution, WarningKind::Empty);
            return;
        }

        for record in parsed.records {
            let key = SampleKey::new(record.test, record.variable, execution.backend.as_str());
            self.sets.push(key, record.value);
        }
    }

    fn warn(&mut self, execution: &Execution, kind: WarningKind) {
        warn!(
            executable = %execution.executable,
            backend = %execution.backend,
            repetition = execution.repetition,
            "{kind}"
        );
        self.warnings.push(ExecutionWarning {
            executable: execution.executable.clone(),
            backend: execution.backend.clone(),
            repetition: execution.repetition,
            kind,
        });
    }

    pub fn warnings(&self) -> &[ExecutionWarning] {
        &self.warnings
    }

    pub fn finish(self) -> (SampleSets, Vec<ExecutionWarning>) {
        (self.sets, self.warnings)
    }
}

/// Human-readable list of executions that produced no data
///
/// Empty when there is nothing to report.
pub fn warnings_report(warnings: &[ExecutionWarning]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut report = String::from(
        "Some executions could not generate any data (for instance because the code \
         crashed) and resulted in warnings. Here is the complete list:\n",
    );
    for (i, warning) in warnings.iter().enumerate() {
        report.push_str(&format!("- Warning {}: {}\n", i + 1, warning.kind));
        report.push_str(&format!("  Executable: {}\n", warning.executable));
        report.push_str(&format!("  Backend: {}\n", warning.backend));
        report.push_str(&format!("  Repetition: {}\n", warning.repetition));
    }
    report
}
