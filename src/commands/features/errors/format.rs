use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::monitor::{BackendError, display_alias};
use crate::reporting::{ErrorMinutesSummary, ReportWindow, format_minutes};

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

pub(super) fn render_window_result<Tz>(
    window: &ReportWindow,
    result: &Result<ErrorMinutesSummary, BackendError>,
    zone: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match result {
        Ok(summary) => render_summary(summary, zone),
        Err(error) => format!(
            "[{}]\n{}\n⚠️ {}: {}",
            window.period,
            range_line(window.start, window.end, zone),
            error.code(),
            error
        ),
    }
}

pub(super) fn render_summary<Tz>(summary: &ErrorMinutesSummary, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![
        format!("[{}]", summary.period),
        range_line(summary.start, summary.end, zone),
        format!("Any target down: {}", format_minutes(summary.any_down_minutes)),
        format!("Sum over targets: {}", format_minutes(summary.total_minutes)),
    ];

    let rows: Vec<String> = summary
        .results
        .iter()
        .filter(|row| row.minutes > 0)
        .map(|row| {
            format!(
                "• {} ({}): {}",
                display_alias(&row.alias),
                row.target,
                format_minutes(row.minutes)
            )
        })
        .collect();

    if rows.is_empty() {
        lines.push("(no down minutes)".to_string());
    } else {
        lines.extend(rows);
    }

    lines.join("\n")
}

fn range_line<Tz>(start: DateTime<Utc>, end: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "Range: {} → {}",
        start.with_timezone(zone).format(LOCAL_FORMAT),
        end.with_timezone(zone).format(LOCAL_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};

    use super::{render_summary, render_window_result};
    use crate::aggregation::TargetMinutes;
    use crate::monitor::BackendError;
    use crate::reporting::{ErrorMinutesSummary, ReportWindow};

    fn window() -> ReportWindow {
        let start = Utc
            .with_ymd_and_hms(2025, 9, 9, 17, 0, 0)
            .single()
            .expect("valid time");
        ReportWindow::absolute(start, start + Duration::hours(2))
    }

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).expect("valid offset")
    }

    fn row(target: &str, alias: &str, minutes: u64) -> TargetMinutes {
        TargetMinutes {
            target: target.to_string(),
            alias: alias.to_string(),
            minutes,
        }
    }

    #[test]
    fn renders_local_range_and_skips_zero_rows() {
        let summary = ErrorMinutesSummary::new(
            &window(),
            vec![row("a:80", "core", 65), row("b:80", "", 3), row("c:80", "edge", 0)],
            66,
        );

        let text = render_summary(&summary, &zone());
        assert_eq!(
            text,
            "[custom]\n\
             Range: 2025-09-10 00:00:00 +07:00 → 2025-09-10 02:00:00 +07:00\n\
             Any target down: 1 h 6 min\n\
             Sum over targets: 1 h 8 min\n\
             • core (a:80): 1 h 5 min\n\
             • - (b:80): 3 min"
        );
    }

    #[test]
    fn quiet_window_says_so() {
        let summary = ErrorMinutesSummary::new(&window(), vec![row("a:80", "", 0)], 0);
        let text = render_summary(&summary, &zone());
        assert!(text.contains("Any target down: 0 min"));
        assert!(text.ends_with("(no down minutes)"));
    }

    #[test]
    fn failed_window_shows_error_code() {
        let text = render_window_result(&window(), &Err(BackendError::Timeout(780)), &zone());
        assert!(text.starts_with("[custom]\nRange: 2025-09-10 00:00:00 +07:00"));
        assert!(text.ends_with("⚠️ BACKEND_TIMEOUT: backend request timed out after 780s"));
    }
}
