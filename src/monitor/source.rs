use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub target: String,
    pub alias: String,
    pub failures_per_minute: f64,
}

impl ProbeResult {
    pub fn display_alias(&self) -> &str {
        display_alias(&self.alias)
    }
}

pub fn display_alias(alias: &str) -> &str {
    if alias.trim().is_empty() { "-" } else { alias }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampedValue {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: ChronoDuration,
}

impl QueryRange {
    pub fn per_minute(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            step: ChronoDuration::minutes(1),
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Http(String),
    #[error("backend request timed out after {0}s")]
    Timeout(u64),
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend rejected query ({error_type}): {message}")]
    Rejected { error_type: String, message: String },
    #[error("backend response could not be decoded: {0}")]
    Decode(String),
    #[error("backend response is malformed: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "BACKEND_HTTP",
            Self::Timeout(_) => "BACKEND_TIMEOUT",
            Self::Status { .. } => "BACKEND_STATUS",
            Self::Rejected { .. } => "BACKEND_REJECTED",
            Self::Decode(_) => "BACKEND_DECODE",
            Self::Malformed(_) => "BACKEND_MALFORMED",
        }
    }
}

/// Read-only access to the probe metric store.
pub trait MetricSource {
    /// Evaluates `expr` at the current instant, one row per (target, alias).
    async fn instant_query(&self, expr: &str) -> Result<Vec<ProbeResult>, BackendError>;

    /// Evaluates `expr` over `range` and returns the single series whose
    /// target and alias labels match exactly. A blank `alias` matches only
    /// a series with a blank or missing alias label.
    async fn range_query(
        &self,
        expr: &str,
        range: &QueryRange,
        target: &str,
        alias: &str,
    ) -> Result<Vec<TimestampedValue>, BackendError>;
}

/// Bounds one backend call to `secs` seconds.
pub async fn with_timeout<T>(
    secs: u64,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    tokio::time::timeout(Duration::from_secs(secs), call)
        .await
        .map_err(|_| BackendError::Timeout(secs))?
}

pub(crate) fn alias_matches(requested: &str, actual: Option<&str>) -> bool {
    let actual = actual.unwrap_or("");
    if requested.trim().is_empty() {
        actual.trim().is_empty()
    } else {
        requested == actual
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{
        collections::{HashMap, VecDeque},
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use super::{
        BackendError, MetricSource, ProbeResult, QueryRange, TimestampedValue, alias_matches,
    };

    /// Scripted backend. Instant queries pop scripted responses in order,
    /// falling back to a per-expression fixed answer.
    #[derive(Default)]
    pub(crate) struct MockMetricSource {
        scripted: Mutex<VecDeque<Result<Vec<ProbeResult>, BackendError>>>,
        fixed: Mutex<HashMap<String, Result<Vec<ProbeResult>, BackendError>>>,
        series: Mutex<Vec<MockSeries>>,
        range_error: Mutex<Option<BackendError>>,
        instant_calls: AtomicUsize,
        range_calls: AtomicUsize,
    }

    struct MockSeries {
        expr: String,
        target: String,
        alias: Option<String>,
        points: Vec<TimestampedValue>,
    }

    impl MockMetricSource {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_instant(&self, response: Result<Vec<ProbeResult>, BackendError>) {
            self.scripted
                .lock()
                .expect("mock lock")
                .push_back(response);
        }

        pub(crate) fn answer(&self, expr: &str, response: Result<Vec<ProbeResult>, BackendError>) {
            self.fixed
                .lock()
                .expect("mock lock")
                .insert(expr.to_string(), response);
        }

        pub(crate) fn add_series(
            &self,
            expr: &str,
            target: &str,
            alias: Option<&str>,
            points: Vec<TimestampedValue>,
        ) {
            self.series.lock().expect("mock lock").push(MockSeries {
                expr: expr.to_string(),
                target: target.to_string(),
                alias: alias.map(str::to_string),
                points,
            });
        }

        pub(crate) fn fail_range_queries(&self, error: BackendError) {
            *self.range_error.lock().expect("mock lock") = Some(error);
        }

        pub(crate) fn instant_calls(&self) -> usize {
            self.instant_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn range_calls(&self) -> usize {
            self.range_calls.load(Ordering::SeqCst)
        }
    }

    impl MetricSource for MockMetricSource {
        async fn instant_query(&self, expr: &str) -> Result<Vec<ProbeResult>, BackendError> {
            self.instant_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(response) = self.scripted.lock().expect("mock lock").pop_front() {
                return response;
            }

            self.fixed
                .lock()
                .expect("mock lock")
                .get(expr)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn range_query(
            &self,
            expr: &str,
            range: &QueryRange,
            target: &str,
            alias: &str,
        ) -> Result<Vec<TimestampedValue>, BackendError> {
            self.range_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.range_error.lock().expect("mock lock").clone() {
                return Err(error);
            }
            let series = self.series.lock().expect("mock lock");
            Ok(series
                .iter()
                .find(|series| {
                    series.expr == expr
                        && series.target == target
                        && alias_matches(alias, series.alias.as_deref())
                })
                .map(|series| {
                    series
                        .points
                        .iter()
                        .filter(|point| {
                            point.timestamp >= range.start && point.timestamp <= range.end
                        })
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }
}
