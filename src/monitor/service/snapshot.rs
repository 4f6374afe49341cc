use std::sync::Arc;

use tokio::sync::Mutex;

use super::super::state::{GLOBAL_THROTTLE_KEY, MonitorSnapshot, MonitorState};

/// Point-in-time copy of the session state for read-only callers.
pub async fn monitor_snapshot(state: &Arc<Mutex<MonitorState>>) -> MonitorSnapshot {
    let state = state.lock().await;
    MonitorSnapshot {
        mode: state.tracker.mode(),
        open_sessions: state.tracker.open_sessions(),
        last_tick: state.last_tick,
        last_global_alert_at: state.throttle.last_sent(GLOBAL_THROTTLE_KEY),
        alerts_sent: state.alerts_sent,
        sessions_closed: state.sessions_closed,
    }
}
