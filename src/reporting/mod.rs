//! Named reporting windows over the guarded minute aggregation.

mod interval;
mod summary;
mod windows;

use chrono::{DateTime, TimeZone};
use futures::future::join_all;

use crate::aggregation::{MinuteAggregator, ProbeQueries};
use crate::config::Guard;
use crate::monitor::{BackendError, MetricSource, with_timeout};

pub use interval::{IntervalError, PeriodDuration};
pub use summary::{ErrorMinutesSummary, format_minutes};
pub use windows::ReportWindow;

const STANDARD_HOURS: [u32; 4] = [1, 2, 3, 6];

/// The windows of the combined `/errors` report, in display order.
pub fn standard_windows<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<ReportWindow> {
    let mut windows: Vec<ReportWindow> = STANDARD_HOURS
        .iter()
        .map(|hours| ReportWindow::last_hours(*hours, now))
        .collect();
    windows.push(ReportWindow::today(now));
    windows.push(ReportWindow::yesterday(now));
    windows.push(ReportWindow::two_days_ago(now));
    windows.push(ReportWindow::last_days(7, now));
    windows.push(ReportWindow::last_days(14, now));
    windows
}

/// Read-only reporting over the metric backend. Never touches session state.
pub struct ReportingFacade<'a, S> {
    aggregator: MinuteAggregator<'a, S>,
    timeout_secs: u64,
}

impl<'a, S: MetricSource> ReportingFacade<'a, S> {
    pub fn new(source: &'a S, queries: &'a ProbeQueries, guard: &'a Guard, timeout_secs: u64) -> Self {
        Self {
            aggregator: MinuteAggregator::new(source, queries, guard),
            timeout_secs,
        }
    }

    /// Per-target breakdown and any-target-down total for one window; both
    /// backend queries run concurrently.
    pub async fn summarize(&self, window: &ReportWindow) -> Result<ErrorMinutesSummary, BackendError> {
        let query = window.query();
        let (per_target, any_down) = tokio::join!(
            with_timeout(self.timeout_secs, self.aggregator.per_target_minutes(query)),
            with_timeout(self.timeout_secs, self.aggregator.any_down_minutes(query)),
        );

        Ok(ErrorMinutesSummary::new(window, per_target?, any_down?))
    }

    /// Summarizes every window concurrently. A failing window does not
    /// affect the others.
    pub async fn fan_out(
        &self,
        windows: Vec<ReportWindow>,
    ) -> Vec<(ReportWindow, Result<ErrorMinutesSummary, BackendError>)> {
        let results = join_all(windows.iter().map(|window| self.summarize(window))).await;
        windows.into_iter().zip(results).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, TimeZone};

    use super::{ReportWindow, ReportingFacade, standard_windows};
    use crate::aggregation::{GuardThresholds, ProbeQueries};
    use crate::config::{Backend, Guard};
    use crate::monitor::{BackendError, ProbeResult, mock::MockMetricSource};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .expect("valid offset")
            .with_ymd_and_hms(2025, 9, 10, 9, 15, 30)
            .single()
            .expect("valid time")
    }

    fn row(target: &str, alias: &str, minutes: f64) -> ProbeResult {
        ProbeResult {
            target: target.to_string(),
            alias: alias.to_string(),
            failures_per_minute: minutes,
        }
    }

    fn answer_window(source: &MockMetricSource, queries: &ProbeQueries, window: &ReportWindow) {
        let guard = GuardThresholds::default();
        let range = window.query().range_secs();
        source.answer(
            &queries.guarded_minutes(&guard, "1s", range, window.end),
            Ok(vec![row("a:80", "core", 3.0), row("b:80", "", 5.0), row("c:80", "", 0.0)]),
        );
        source.answer(
            &queries.any_down_minutes(&guard, "1s", range, window.end),
            Ok(vec![row("", "", 6.0)]),
        );
    }

    #[tokio::test]
    async fn today_is_idempotent_without_new_data() {
        let source = MockMetricSource::new();
        let queries = ProbeQueries::from_backend(&Backend::default());
        let guard = Guard::default();
        let window = ReportWindow::today(&now());
        answer_window(&source, &queries, &window);

        let facade = ReportingFacade::new(&source, &queries, &guard, 60);
        let first = facade.summarize(&ReportWindow::today(&now())).await.expect("ok");
        let second = facade.summarize(&ReportWindow::today(&now())).await.expect("ok");

        assert_eq!(first, second);
        assert_eq!(first.total_minutes, 8);
        assert_eq!(first.any_down_minutes, 6);
        assert_eq!(first.results[0].target, "b:80");
        assert_eq!(first.results.len(), 3);
    }

    #[tokio::test]
    async fn empty_window_never_queries_backend() {
        let source = MockMetricSource::new();
        let queries = ProbeQueries::from_backend(&Backend::default());
        let guard = Guard::default();
        let facade = ReportingFacade::new(&source, &queries, &guard, 60);

        let end = now().with_timezone(&chrono::Utc);
        let summary = facade
            .summarize(&ReportWindow::absolute(end, end - chrono::Duration::hours(1)))
            .await
            .expect("ok");

        assert_eq!(summary.total_minutes, 0);
        assert_eq!(summary.any_down_minutes, 0);
        assert!(summary.results.is_empty());
        assert_eq!(source.instant_calls(), 0);
    }

    #[tokio::test]
    async fn fan_out_isolates_failing_windows() {
        let source = MockMetricSource::new();
        let queries = ProbeQueries::from_backend(&Backend::default());
        let guard = Guard::default();
        let windows = standard_windows(&now());
        assert_eq!(windows.len(), 9);

        let today = windows
            .iter()
            .find(|window| window.period == "today")
            .expect("today window")
            .clone();
        answer_window(&source, &queries, &today);
        let yesterday = windows
            .iter()
            .find(|window| window.period == "yesterday")
            .expect("yesterday window");
        source.answer(
            &queries.guarded_minutes(
                &GuardThresholds::default(),
                "1s",
                yesterday.query().range_secs(),
                yesterday.end,
            ),
            Err(BackendError::Timeout(780)),
        );

        let facade = ReportingFacade::new(&source, &queries, &guard, 60);
        let results = facade.fan_out(windows).await;

        assert_eq!(results.len(), 9);
        assert_eq!(results[0].0.period, "last-1h");
        for (window, result) in &results {
            match window.period.as_str() {
                "today" => assert_eq!(result.as_ref().expect("ok").total_minutes, 8),
                "yesterday" => assert!(result.is_err()),
                _ => assert!(result.as_ref().expect("ok").results.is_empty()),
            }
        }
    }
}
