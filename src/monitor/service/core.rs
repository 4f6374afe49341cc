use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::aggregation::ProbeQueries;
use crate::config::RuntimeConfig;
use crate::notify::NotificationSink;

use super::super::{
    evaluator::{Notification, classify_tick, evaluate_tick_at},
    source::{MetricSource, with_timeout},
    state::{MonitorState, TickKind, TickOutcome},
};
use super::recovery::{ReportInputs, deliver_recovery};

/// Collaborators one poll tick talks to.
pub struct TickDeps<'a, S, N> {
    pub source: &'a S,
    pub sink: &'a N,
    pub queries: &'a ProbeQueries,
    pub query_timeout_secs: u64,
}

/// One poll tick: fetch, classify, update session and throttle state, then
/// notify. The backend answer is complete before any state is touched.
pub async fn check_targets<S: MetricSource, N: NotificationSink>(
    deps: &TickDeps<'_, S, N>,
    runtime_config: &RuntimeConfig,
    state: &Arc<Mutex<MonitorState>>,
    now: DateTime<Utc>,
) {
    let result = with_timeout(
        deps.query_timeout_secs,
        deps.source
            .instant_query(&deps.queries.failures_per_minute()),
    )
    .await;

    if let Err(error) = &result {
        log::warn!(
            "monitor_backend_unavailable code={} policy={:?} error={}",
            error.code(),
            runtime_config.alerts.indeterminate,
            error
        );
    }

    let outcome = classify_tick(result, runtime_config.alerts.down_threshold);
    let down_count = match &outcome {
        TickOutcome::Down(downs) => downs.len(),
        _ => 0,
    };

    tracing::info!(
        target: "monitor",
        module = "monitor",
        outcome = TickKind::of(&outcome).as_str(),
        down_count,
        down_threshold = runtime_config.alerts.down_threshold,
        "monitor_tick"
    );

    let effects = evaluate_tick_at(&runtime_config.alerts, state, &outcome, now).await;
    let mode = state.lock().await.tracker.mode();

    for notification in effects.notifications {
        let sent = match &notification {
            Notification::Text(text) => deps.sink.send_text(text).await,
            Notification::Alert(record) => deps.sink.send_alert(record).await,
        };
        if let Err(error) = sent {
            log::error!("CRITICAL: failed to send ping alert: {}", error);
        }
    }

    let inputs = ReportInputs {
        source: deps.source,
        queries: deps.queries,
        query_timeout_secs: deps.query_timeout_secs,
    };
    for closed in &effects.closed {
        deliver_recovery(
            &inputs,
            deps.sink,
            &runtime_config.guard,
            &runtime_config.chart,
            mode,
            closed,
        )
        .await;
    }
}
