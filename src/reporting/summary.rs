use chrono::{DateTime, Utc};

use crate::aggregation::TargetMinutes;

use super::windows::ReportWindow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMinutesSummary {
    pub period: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Sum over targets; overlapping outages are counted once per target.
    pub total_minutes: u64,
    /// Minutes in which at least one target was down.
    pub any_down_minutes: u64,
    /// Worst target first.
    pub results: Vec<TargetMinutes>,
}

impl ErrorMinutesSummary {
    pub fn new(window: &ReportWindow, mut results: Vec<TargetMinutes>, any_down_minutes: u64) -> Self {
        results.sort_by(|left, right| {
            right
                .minutes
                .cmp(&left.minutes)
                .then_with(|| left.target.cmp(&right.target))
                .then_with(|| left.alias.cmp(&right.alias))
        });

        Self {
            period: window.period.clone(),
            start: window.start,
            end: window.end,
            total_minutes: results.iter().map(|row| row.minutes).sum(),
            any_down_minutes,
            results,
        }
    }
}

/// `1 day 2 h 5 min`; zero renders as `0 min`.
pub fn format_minutes(minutes: u64) -> String {
    let days = minutes / (24 * 60);
    let hours = (minutes % (24 * 60)) / 60;
    let mins = minutes % 60;

    let mut parts = Vec::new();
    match days {
        0 => {}
        1 => parts.push("1 day".to_string()),
        days => parts.push(format!("{days} days")),
    }
    if hours > 0 {
        parts.push(format!("{hours} h"));
    }
    if mins > 0 || parts.is_empty() {
        parts.push(format!("{mins} min"));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{ErrorMinutesSummary, format_minutes};
    use crate::aggregation::TargetMinutes;
    use crate::reporting::windows::ReportWindow;

    fn row(target: &str, minutes: u64) -> TargetMinutes {
        TargetMinutes {
            target: target.to_string(),
            alias: String::new(),
            minutes,
        }
    }

    #[test]
    fn formats_minutes_compactly() {
        assert_eq!(format_minutes(0), "0 min");
        assert_eq!(format_minutes(5), "5 min");
        assert_eq!(format_minutes(60), "1 h");
        assert_eq!(format_minutes(24 * 60 + 2 * 60 + 5), "1 day 2 h 5 min");
        assert_eq!(format_minutes(3 * 24 * 60), "3 days");
    }

    #[test]
    fn summary_sorts_desc_and_sums() {
        let start = Utc
            .with_ymd_and_hms(2025, 9, 1, 0, 0, 0)
            .single()
            .expect("valid time");
        let window = ReportWindow::absolute(start, start + chrono::Duration::minutes(5));

        let summary = ErrorMinutesSummary::new(
            &window,
            vec![row("c", 0), row("a", 3), row("b", 3), row("d", 1)],
            4,
        );

        let order: Vec<&str> = summary.results.iter().map(|row| row.target.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "d", "c"]);
        assert_eq!(summary.total_minutes, 7);
        assert_eq!(summary.any_down_minutes, 4);
        assert_eq!(summary.period, "custom");
    }
}
