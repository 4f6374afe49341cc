use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;

use crate::config::{Alerts, SessionMode};
use crate::notify::AlertRecord;

use super::source::{BackendError, ProbeResult};
use super::state::{
    ClosedSession, GLOBAL_THROTTLE_KEY, MonitorState, SessionTiming, TickKind, TickOutcome,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Notification {
    Text(String),
    Alert(AlertRecord),
}

#[derive(Debug, Default)]
pub(crate) struct TickEffects {
    pub(crate) notifications: Vec<Notification>,
    pub(crate) closed: Vec<ClosedSession>,
}

/// Targets at or above `down_threshold` are down. A failed query is
/// indeterminate, never clear.
pub(crate) fn classify_tick(
    result: Result<Vec<ProbeResult>, BackendError>,
    down_threshold: f64,
) -> TickOutcome {
    let Ok(rows) = result else {
        return TickOutcome::Indeterminate;
    };

    let downs: Vec<ProbeResult> = rows
        .into_iter()
        .filter(|row| row.failures_per_minute >= down_threshold)
        .collect();

    if downs.is_empty() {
        TickOutcome::Clear
    } else {
        TickOutcome::Down(downs)
    }
}

pub(crate) async fn evaluate_tick_at(
    alerts: &Alerts,
    state: &Arc<Mutex<MonitorState>>,
    outcome: &TickOutcome,
    now: DateTime<Utc>,
) -> TickEffects {
    let timing = SessionTiming {
        clear_period: ChronoDuration::seconds(alerts.clear_period_secs as i64),
        indeterminate: alerts.indeterminate,
    };

    let mut state = state.lock().await;
    state.throttle.set_cooldown(alerts.cooldown_secs);
    state.last_tick = Some((now, TickKind::of(outcome)));

    let closed = state.tracker.observe(outcome, now, timing);
    state.sessions_closed += closed.len() as u64;

    let mut notifications = Vec::new();
    if let TickOutcome::Down(downs) = outcome {
        match state.tracker.mode() {
            SessionMode::Global => {
                if state.throttle.should_notify(GLOBAL_THROTTLE_KEY, now) {
                    notifications.push(Notification::Text(global_alert_text(downs)));
                }
            }
            SessionMode::PerTarget => {
                for down in downs {
                    if state.throttle.should_notify(&down.target, now) {
                        notifications.push(Notification::Alert(AlertRecord {
                            target: down.target.clone(),
                            alias: down.alias.clone(),
                            failures_per_minute: down.failures_per_minute,
                            observed_at: now,
                        }));
                    }
                }
            }
        }
    }
    state.alerts_sent += notifications.len() as u64;

    TickEffects {
        notifications,
        closed,
    }
}

/// One line per down target, worst first.
pub(crate) fn global_alert_text(downs: &[ProbeResult]) -> String {
    let mut sorted: Vec<&ProbeResult> = downs.iter().collect();
    sorted.sort_by(|left, right| {
        right
            .failures_per_minute
            .total_cmp(&left.failures_per_minute)
            .then_with(|| left.target.cmp(&right.target))
    });

    let mut text = String::from("🛑 GLOBAL PING ALERT\n");
    for down in sorted {
        text.push_str(&format!(
            "• {} ({}) → {:.0} errors/min\n",
            down.target,
            down.display_alias(),
            down.failures_per_minute
        ));
    }
    text
}
