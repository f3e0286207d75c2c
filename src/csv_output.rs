//! CSV output format for spreadsheet analysis and machine parsing
//!
//! Significant digits are written as their numeric value, `maximal` when no
//! spread was observed, and left empty when undefined. A missing p-value is
//! also an empty field.

use crate::aggregate::AggregatedGroup;
use crate::run_stats::RunStatistics;
use crate::sigdigits::SignificantDigits;
use crate::stats::Distribution;
use crate::store::SeriesPoint;

const STATISTICS_HEADER: [&str; 15] = [
    "test",
    "variable",
    "backend",
    "timestamp",
    "mu",
    "sigma",
    "pvalue",
    "s_base2",
    "s_base10",
    "min",
    "q25",
    "q50",
    "q75",
    "max",
    "n_samples",
];

const DISTRIBUTION_FIELDS: [&str; 6] = ["min", "q25", "q50", "q75", "max", "mu"];

/// CSV table: header plus escaped rows
#[derive(Debug, Default)]
pub struct CsvOutput {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvOutput {
    fn with_header<S: AsRef<str>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Table of per-run statistics rows
    pub fn statistics<'a>(rows: impl IntoIterator<Item = &'a RunStatistics>) -> Self {
        let mut output = Self::with_header(STATISTICS_HEADER);
        for row in rows {
            output.rows.push(statistics_fields(row));
        }
        output
    }

    /// Table of aggregated groups, one column per distribution field
    pub fn groups(groups: &[AggregatedGroup]) -> Self {
        let mut header = vec![
            "key".to_string(),
            "display_key".to_string(),
            "mu".to_string(),
            "n_samples".to_string(),
        ];
        for prefix in ["sigma", "s_base10", "s_base2"] {
            header.extend(DISTRIBUTION_FIELDS.iter().map(|f| format!("{prefix}_{f}")));
        }

        let mut output = Self::with_header(header);
        for group in groups {
            let mut fields = vec![
                Self::escape_field(&group.key),
                Self::escape_field(&group.display_key),
                group.mu.to_string(),
                group.n_samples.to_string(),
            ];
            fields.extend(distribution_fields(Some(&group.sigma)));
            fields.extend(distribution_fields(group.s_base10.as_ref()));
            fields.extend(distribution_fields(group.s_base2.as_ref()));
            output.rows.push(fields);
        }
        output
    }

    /// Table of a per-run series: label and commit columns, then statistics
    pub fn series(points: &[SeriesPoint]) -> Self {
        let header = ["label", "is_git_commit", "hash", "author", "message"]
            .into_iter()
            .chain(STATISTICS_HEADER);

        let mut output = Self::with_header(header);
        for point in points {
            let mut fields = vec![
                Self::escape_field(&point.label),
                point.is_git_commit.to_string(),
                Self::escape_field(&point.hash),
                Self::escape_field(&point.author),
                Self::escape_field(&point.message),
            ];
            fields.extend(statistics_fields(&point.statistics));
            output.rows.push(fields);
        }
        output
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    pub fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = self.header.join(",");
        output.push('\n');

        for row in &self.rows {
            output.push_str(&row.join(","));
            output.push('\n');
        }

        output
    }
}

fn statistics_fields(row: &RunStatistics) -> Vec<String> {
    vec![
        CsvOutput::escape_field(&row.test),
        CsvOutput::escape_field(&row.variable),
        CsvOutput::escape_field(&row.backend),
        row.timestamp.to_string(),
        row.mu.to_string(),
        row.sigma.to_string(),
        row.pvalue.map(|p| p.to_string()).unwrap_or_default(),
        digits_field(&row.s_base2),
        digits_field(&row.s_base10),
        row.min.to_string(),
        row.q25.to_string(),
        row.q50.to_string(),
        row.q75.to_string(),
        row.max.to_string(),
        row.n_samples.to_string(),
    ]
}

fn digits_field(digits: &SignificantDigits) -> String {
    match digits {
        SignificantDigits::Digits(value) => value.to_string(),
        SignificantDigits::Maximal => "maximal".to_string(),
        SignificantDigits::Undefined => String::new(),
    }
}

fn distribution_fields(distribution: Option<&Distribution>) -> Vec<String> {
    match distribution {
        Some(d) => [d.min, d.q25, d.q50, d.q75, d.max, d.mu]
            .iter()
            .map(f64::to_string)
            .collect(),
        None => vec![String::new(); DISTRIBUTION_FIELDS.len()],
    }
}
