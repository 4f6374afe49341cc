//! Guarded minute aggregation: turns sub-minute probe samples into
//! "this target was down this minute" flags and sums them over a window.
//!
//! The guard is evaluated inside the backend by PromQL built by
//! [`ProbeQueries`]; recovery reports and `/error*` reports both go
//! through [`MinuteAggregator`].

mod promql;

use chrono::{DateTime, Utc};

use crate::config::Guard;
use crate::monitor::{BackendError, MetricSource};

pub use promql::ProbeQueries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardThresholds {
    pub fail_threshold: u32,
    pub min_samples: u32,
}

impl Default for GuardThresholds {
    fn default() -> Self {
        Self {
            fail_threshold: 5,
            min_samples: 5,
        }
    }
}

impl GuardThresholds {
    pub fn from_guard(guard: &Guard) -> Self {
        Self {
            fail_threshold: guard.fail_threshold,
            min_samples: guard.min_samples,
        }
    }
}

/// A `[start, end)` aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardedMinuteQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl GuardedMinuteQuery {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn range_secs(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_seconds()
    }

    pub fn is_empty(&self) -> bool {
        self.range_secs() <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMinutes {
    pub target: String,
    pub alias: String,
    pub minutes: u64,
}

pub struct MinuteAggregator<'a, S> {
    source: &'a S,
    queries: &'a ProbeQueries,
    guard: GuardThresholds,
    inner_resolution: &'a str,
}

impl<'a, S: MetricSource> MinuteAggregator<'a, S> {
    pub fn new(source: &'a S, queries: &'a ProbeQueries, guard: &'a Guard) -> Self {
        Self {
            source,
            queries,
            guard: GuardThresholds::from_guard(guard),
            inner_resolution: guard.inner_resolution.as_str(),
        }
    }

    /// Guarded down minutes per target. Every target the backend knows in
    /// the window is returned, healthy ones with zero minutes. An empty
    /// window returns nothing without touching the backend.
    pub async fn per_target_minutes(
        &self,
        window: GuardedMinuteQuery,
    ) -> Result<Vec<TargetMinutes>, BackendError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let expr = self.queries.guarded_minutes(
            &self.guard,
            self.inner_resolution,
            window.range_secs(),
            window.end,
        );
        let rows = self.source.instant_query(&expr).await?;

        Ok(rows
            .into_iter()
            .map(|row| TargetMinutes {
                target: row.target,
                alias: row.alias,
                minutes: whole_minutes(row.failures_per_minute),
            })
            .collect())
    }

    /// Minutes in which at least one target was down.
    pub async fn any_down_minutes(&self, window: GuardedMinuteQuery) -> Result<u64, BackendError> {
        if window.is_empty() {
            return Ok(0);
        }

        let expr = self.queries.any_down_minutes(
            &self.guard,
            self.inner_resolution,
            window.range_secs(),
            window.end,
        );
        let rows = self.source.instant_query(&expr).await?;

        Ok(rows
            .first()
            .map(|row| whole_minutes(row.failures_per_minute))
            .unwrap_or(0))
    }
}

fn whole_minutes(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{GuardedMinuteQuery, MinuteAggregator, ProbeQueries};
    use crate::config::{Backend, Guard};
    use crate::monitor::{BackendError, ProbeResult, mock::MockMetricSource};

    fn row(target: &str, alias: &str, value: f64) -> ProbeResult {
        ProbeResult {
            target: target.to_string(),
            alias: alias.to_string(),
            failures_per_minute: value,
        }
    }

    fn window() -> GuardedMinuteQuery {
        let start = Utc
            .with_ymd_and_hms(2025, 9, 1, 0, 0, 0)
            .single()
            .expect("valid time");
        GuardedMinuteQuery::new(start, start + Duration::minutes(5))
    }

    #[tokio::test]
    async fn empty_window_skips_backend() {
        let source = MockMetricSource::new();
        let queries = ProbeQueries::from_backend(&Backend::default());
        let guard = Guard::default();
        let aggregator = MinuteAggregator::new(&source, &queries, &guard);

        let start = window().start;
        let backwards = GuardedMinuteQuery::new(start, start - Duration::minutes(1));
        let zero = GuardedMinuteQuery::new(start, start);

        assert!(aggregator.per_target_minutes(backwards).await.expect("ok").is_empty());
        assert!(aggregator.per_target_minutes(zero).await.expect("ok").is_empty());
        assert_eq!(aggregator.any_down_minutes(backwards).await.expect("ok"), 0);
        assert_eq!(source.instant_calls(), 0);
    }

    #[tokio::test]
    async fn per_target_rounds_backend_values() {
        let source = MockMetricSource::new();
        let queries = ProbeQueries::from_backend(&Backend::default());
        let guard = Guard::default();
        source.push_instant(Ok(vec![row("a:80", "core", 3.0000001), row("b:80", "", 0.0)]));

        let aggregator = MinuteAggregator::new(&source, &queries, &guard);
        let rows = aggregator.per_target_minutes(window()).await.expect("ok");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].minutes, 3);
        assert_eq!(rows[1].minutes, 0);
        assert_eq!(source.instant_calls(), 1);
    }

    #[tokio::test]
    async fn any_down_handles_empty_and_errors() {
        let source = MockMetricSource::new();
        let queries = ProbeQueries::from_backend(&Backend::default());
        let guard = Guard::default();
        source.push_instant(Ok(Vec::new()));
        source.push_instant(Ok(vec![row("", "", 4.0)]));
        source.push_instant(Err(BackendError::Timeout(15)));

        let aggregator = MinuteAggregator::new(&source, &queries, &guard);
        assert_eq!(aggregator.any_down_minutes(window()).await.expect("ok"), 0);
        assert_eq!(aggregator.any_down_minutes(window()).await.expect("ok"), 4);
        assert!(aggregator.any_down_minutes(window()).await.is_err());
    }
}
