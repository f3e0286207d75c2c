//! Human-readable reports
//!
//! Fixed-width tables in the spirit of `strace -c`, one line per row.

use crate::aggregate::AggregatedGroup;
use crate::sigdigits::SignificantDigits;
use crate::store::{Run, SeriesPoint};

const RULE: &str =
    "------------ ------------ -------- ------ ------ ------- ------------------------";

fn digits(value: &SignificantDigits) -> String {
    match value {
        SignificantDigits::Digits(v) => format!("{v:.2}"),
        SignificantDigits::Maximal => "max".to_string(),
        SignificantDigits::Undefined => "-".to_string(),
    }
}

fn pvalue(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |p| format!("{p:.3}"))
}

/// Per-run statistics table
pub fn run_report(run: &Run) -> String {
    let metadata = &run.metadata;
    let mut out = match metadata.hash() {
        Some(hash) => format!(
            "Run {} (commit {hash} by {}: {})\n\n",
            metadata.timestamp, metadata.author, metadata.message
        ),
        None => format!("Run {}\n\n", metadata.timestamp),
    };

    if run.statistics.is_empty() {
        out.push_str("No statistics computed.\n");
        return out;
    }

    out.push_str("          mu        sigma   pvalue     s2    s10 samples key\n");
    out.push_str(RULE);
    out.push('\n');
    for row in &run.statistics {
        out.push_str(&format!(
            "{:>12.5e} {:>12.5e} {:>8} {:>6} {:>6} {:>7} {}:{} [{}]\n",
            row.mu,
            row.sigma,
            pvalue(row.pvalue),
            digits(&row.s_base2),
            digits(&row.s_base10),
            row.n_samples,
            row.test,
            row.variable,
            row.backend
        ));
    }
    out
}

/// Aggregated groups table
pub fn groups_report(groups: &[AggregatedGroup]) -> String {
    if groups.is_empty() {
        return "No rows match the selection.\n".to_string();
    }

    let mut out = String::from("          mu   sigma(q50)  s10(q50) s10(min) members key\n");
    out.push_str(RULE);
    out.push('\n');
    for group in groups {
        let (s10_median, s10_min) = group
            .s_base10
            .map_or(("-".to_string(), "-".to_string()), |d| {
                (format!("{:.2}", d.q50), format!("{:.2}", d.min))
            });
        out.push_str(&format!(
            "{:>12.5e} {:>12.5e} {:>9} {:>8} {:>7} {}\n",
            group.mu, group.sigma.q50, s10_median, s10_min, group.n_samples, group.display_key
        ));
    }
    out
}

/// Per-run series table, oldest run first
pub fn series_report(points: &[SeriesPoint]) -> String {
    if points.is_empty() {
        return "No run holds this sample set.\n".to_string();
    }

    let mut out = String::from("          mu        sigma   pvalue     s2    s10 samples run\n");
    out.push_str(RULE);
    out.push('\n');
    for point in points {
        let row = &point.statistics;
        out.push_str(&format!(
            "{:>12.5e} {:>12.5e} {:>8} {:>6} {:>6} {:>7} {}\n",
            row.mu,
            row.sigma,
            pvalue(row.pvalue),
            digits(&row.s_base2),
            digits(&row.s_base10),
            row.n_samples,
            point.label
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SampleKey;
    use crate::probes::SampleSets;
    use crate::run_stats::StatisticsComputer;
    use crate::store::RunMetadata;

    fn run(metadata: RunMetadata) -> Run {
        let sets: SampleSets = [
            (SampleKey::new("dot", "result", "mca"), vec![1.0, 1.0, 1.0, 1.0]),
            (SampleKey::new("sum", "total", "mca"), vec![1.0, 2.0]),
        ]
        .into_iter()
        .collect();
        StatisticsComputer::default().process_run(&sets, metadata)
    }

    #[test]
    fn test_run_report() {
        let report = run_report(&run(RunMetadata::commit(5, "abc1234", "Ada", "Fix dot")));
        assert!(report.starts_with("Run 5 (commit abc1234 by Ada: Fix dot)"));
        assert!(report.contains("max"));
        assert!(report.contains("dot:result [mca]"));
        // Two samples: no p-value
        let sum_line = report.lines().find(|l| l.ends_with("sum:total [mca]")).unwrap();
        assert!(sum_line.contains(" - "));
    }

    #[test]
    fn test_empty_run_report() {
        let report = run_report(&Run {
            metadata: RunMetadata::untracked(9),
            statistics: Vec::new(),
        });
        assert_eq!(report, "Run 9\n\nNo statistics computed.\n");
    }

    #[test]
    fn test_empty_views() {
        assert!(groups_report(&[]).contains("No rows match"));
        assert!(series_report(&[]).contains("No run holds"));
    }
}
