//! Display names for runs and group keys
//!
//! Runs are named by how long ago they happened ("3 days ago"), suffixed
//! with their commit hash when they have one. Consecutive runs that would
//! get the same name are told apart by a counter: `["2 hours ago",
//! "2 hours ago (1)", "2 hours ago (2)"]`.

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;

/// Current time as seconds since the Unix epoch
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

/// "N units ago" for the time elapsed between `timestamp` and `now`
///
/// Timestamps in the future count as no time elapsed.
pub fn relative_time(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp).max(0);

    let (count, unit) = match diff {
        d if d < MINUTE => return "Less than a minute ago".to_string(),
        d if d < HOUR => (d / MINUTE, "minute"),
        d if d < DAY => (d / HOUR, "hour"),
        d if d < WEEK => (d / DAY, "day"),
        d if d < MONTH => (d / WEEK, "week"),
        d => (d / MONTH, "month"),
    };

    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Stateful run namer
///
/// Holds the previous label and a duplicate counter. Call
/// [`RunLabeler::reset`] before labeling a new sequence of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLabeler {
    previous: Option<String>,
    counter: u32,
}

impl RunLabeler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous label and the duplicate counter
    pub fn reset(&mut self) {
        self.previous = None;
        self.counter = 0;
    }

    /// Name the run at `timestamp`, as seen at `now`
    pub fn label(&mut self, timestamp: i64, hash: Option<&str>, now: i64) -> String {
        let mut label = relative_time(timestamp, now);
        if let Some(hash) = hash.filter(|h| !h.is_empty()) {
            label.push_str(&format!(" ({hash})"));
        }

        if self.previous.as_deref() == Some(label.as_str()) {
            self.counter += 1;
            format!("{label} ({})", self.counter)
        } else {
            self.counter = 0;
            self.previous = Some(label.clone());
            label
        }
    }

    /// [`RunLabeler::label`] against the system clock
    pub fn label_now(&mut self, timestamp: i64, hash: Option<&str>) -> String {
        self.label(timestamp, hash, unix_now())
    }
}

/// Shorten `name` to `prefix...suffix` when it exceeds `max_len` characters
pub fn abbreviate(name: &str, max_len: usize, keep: usize) -> Cow<'_, str> {
    let len = name.chars().count();
    if len <= max_len {
        return Cow::Borrowed(name);
    }

    let prefix: String = name.chars().take(keep).collect();
    let suffix: String = name.chars().skip(len.saturating_sub(keep)).collect();
    Cow::Owned(format!("{prefix}...{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_relative_time_buckets() {
        let cases = [
            (0, "Less than a minute ago"),
            (59, "Less than a minute ago"),
            (60, "1 minute ago"),
            (119, "1 minute ago"),
            (120, "2 minutes ago"),
            (3 * HOUR, "3 hours ago"),
            (DAY, "1 day ago"),
            (6 * DAY + 23 * HOUR, "6 days ago"),
            (WEEK, "1 week ago"),
            (29 * DAY, "4 weeks ago"),
            (MONTH, "1 month ago"),
            (75 * DAY, "2 months ago"),
            (400 * DAY, "13 months ago"),
        ];
        for (elapsed, expected) in cases {
            assert_eq!(relative_time(NOW - elapsed, NOW), expected, "{elapsed}s");
        }
    }

    #[test]
    fn test_future_timestamp() {
        assert_eq!(relative_time(NOW + 500, NOW), "Less than a minute ago");
    }

    #[test]
    fn test_label_with_hash() {
        let mut labeler = RunLabeler::new();
        assert_eq!(
            labeler.label(NOW - 2 * DAY, Some("3c1f9a2"), NOW),
            "2 days ago (3c1f9a2)"
        );
        assert_eq!(labeler.label(NOW - 2 * DAY, Some(""), NOW), "2 days ago");
    }

    #[test]
    fn test_duplicates_are_numbered() {
        let mut labeler = RunLabeler::new();
        let t = NOW - 2 * HOUR;
        assert_eq!(labeler.label(t, None, NOW), "2 hours ago");
        assert_eq!(labeler.label(t, None, NOW), "2 hours ago (1)");
        assert_eq!(labeler.label(t - 60, None, NOW), "2 hours ago (2)");
        assert_eq!(labeler.label(NOW - DAY, None, NOW), "1 day ago");
        assert_eq!(labeler.label(t, None, NOW), "2 hours ago");
    }

    #[test]
    fn test_only_adjacent_duplicates_collide() {
        let mut labeler = RunLabeler::new();
        assert_eq!(labeler.label(NOW - HOUR, None, NOW), "1 hour ago");
        assert_eq!(labeler.label(NOW - DAY, None, NOW), "1 day ago");
        assert_eq!(labeler.label(NOW - HOUR, None, NOW), "1 hour ago");
    }

    #[test]
    fn test_reset_makes_labeling_deterministic() {
        let timestamps = [NOW - 10, NOW - 10, NOW - 3 * WEEK];
        let mut labeler = RunLabeler::new();

        let first: Vec<String> = timestamps
            .iter()
            .map(|t| labeler.label(*t, None, NOW))
            .collect();
        labeler.reset();
        let second: Vec<String> = timestamps
            .iter()
            .map(|t| labeler.label(*t, None, NOW))
            .collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec!["Less than a minute ago", "Less than a minute ago (1)", "3 weeks ago"]
        );
    }

    #[test]
    fn test_without_reset_state_carries_over() {
        let mut labeler = RunLabeler::new();
        labeler.label(NOW, None, NOW);
        assert_eq!(labeler.label(NOW, None, NOW), "Less than a minute ago (1)");
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("short_name", 25, 10), "short_name");
        assert_eq!(abbreviate(&"a".repeat(25), 25, 10), "a".repeat(25));

        let long = "abcdefghij_middle_part_klmnopqrst";
        assert_eq!(abbreviate(long, 25, 10), "abcdefghij...klmnopqrst");
    }

    #[test]
    fn test_abbreviate_multibyte() {
        let long = "é".repeat(30);
        let short = abbreviate(&long, 25, 10);
        assert_eq!(short.chars().count(), 23);
        assert!(short.starts_with("éééééééééé..."));
    }

    #[test]
    fn test_unix_now_is_recent() {
        assert!(unix_now() > NOW);
    }
}
