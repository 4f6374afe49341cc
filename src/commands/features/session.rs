use chrono::{DateTime, Local, Utc};
use teloxide::{prelude::*, types::ParseMode};

use crate::app_context::AppContext;
use crate::config::Alerts;
use crate::monitor::{MonitorSnapshot, SessionSnapshot, display_alias, monitor_snapshot};

use super::super::helpers::as_html_block;

pub(crate) async fn handle_session(
    bot: &Bot,
    msg: &Message,
    app_context: &AppContext,
) -> ResponseResult<()> {
    let alerts = app_context.runtime_config.read().await.alerts.clone();
    let snapshot = monitor_snapshot(&app_context.monitor_state).await;

    let body = session_body(&snapshot, &alerts, Utc::now());
    bot.send_message(msg.chat.id, as_html_block("Outage Session", &body))
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

fn session_body(snapshot: &MonitorSnapshot, alerts: &Alerts, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    if snapshot.open_sessions.is_empty() {
        lines.push("Status: idle ✅".to_string());
    } else {
        lines.push(format!(
            "Status: ACTIVE 🛑 ({} open)",
            snapshot.open_sessions.len()
        ));
        for session in &snapshot.open_sessions {
            lines.push(String::new());
            lines.extend(session_lines(session, alerts.clear_period_secs, now));
        }
    }

    lines.push(String::new());
    lines.push(format!("Mode: {}", snapshot.mode.as_str()));
    lines.push(format!(
        "Down threshold: {} errors/min, clear period: {}s",
        alerts.down_threshold, alerts.clear_period_secs
    ));
    lines.push(format!("Indeterminate ticks: {}", alerts.indeterminate.as_str()));

    let cooldown = match snapshot.last_global_alert_at {
        Some(sent) => {
            let remaining = i64::try_from(alerts.cooldown_secs)
                .unwrap_or(i64::MAX)
                .saturating_sub(now.signed_duration_since(sent).num_seconds());
            if remaining > 0 {
                format!("cooling down, {remaining}s left")
            } else {
                "ready".to_string()
            }
        }
        None => "ready (no alert sent yet)".to_string(),
    };
    lines.push(format!("Alert cooldown ({}s): {}", alerts.cooldown_secs, cooldown));

    let last_tick = snapshot
        .last_tick
        .map(|(at, kind)| format!("{} at {}", kind.as_str(), at.to_rfc3339()))
        .unwrap_or_else(|| "not available yet".to_string());
    lines.push(format!("Last tick: {last_tick}"));
    lines.push(format!(
        "Alerts sent: {}, sessions closed: {}",
        snapshot.alerts_sent, snapshot.sessions_closed
    ));

    lines.join("\n")
}

fn session_lines(session: &SessionSnapshot, clear_period_secs: u64, now: DateTime<Utc>) -> Vec<String> {
    let members: Vec<String> = session
        .members
        .iter()
        .map(|(target, alias)| format!("{} ({})", target, display_alias(alias)))
        .collect();

    let streak = match session.clear_since {
        Some(since) => format!(
            "clear for {}s of {}s",
            now.signed_duration_since(since).num_seconds().max(0),
            clear_period_secs
        ),
        None => "not clearing".to_string(),
    };

    vec![
        format!(
            "Started: {}",
            session
                .start
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S %:z")
        ),
        format!(
            "Open for: {}s",
            now.signed_duration_since(session.start).num_seconds().max(0)
        ),
        format!("Members: {}", members.join(", ")),
        format!("Clear streak: {streak}"),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::session_body;
    use crate::config::{Alerts, SessionMode};
    use crate::monitor::{MonitorSnapshot, SessionSnapshot, TickKind};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0)
            .single()
            .expect("valid time")
    }

    fn idle() -> MonitorSnapshot {
        MonitorSnapshot {
            mode: SessionMode::Global,
            open_sessions: Vec::new(),
            last_tick: None,
            last_global_alert_at: None,
            alerts_sent: 0,
            sessions_closed: 0,
        }
    }

    #[test]
    fn idle_snapshot_reports_ready_cooldown() {
        let body = session_body(&idle(), &Alerts::default(), t0());
        assert!(body.starts_with("Status: idle ✅"));
        assert!(body.contains("Mode: global"));
        assert!(body.contains("Alert cooldown (60s): ready (no alert sent yet)"));
        assert!(body.contains("Last tick: not available yet"));
    }

    #[test]
    fn active_snapshot_lists_members_and_streak() {
        let snapshot = MonitorSnapshot {
            open_sessions: vec![SessionSnapshot {
                start: t0(),
                members: vec![
                    ("a:80".to_string(), "core".to_string()),
                    ("b:80".to_string(), String::new()),
                ],
                clear_since: Some(t0() + Duration::seconds(30)),
            }],
            last_tick: Some((t0() + Duration::seconds(45), TickKind::Clear)),
            last_global_alert_at: Some(t0()),
            alerts_sent: 1,
            ..idle()
        };

        let body = session_body(&snapshot, &Alerts::default(), t0() + Duration::seconds(45));
        assert!(body.starts_with("Status: ACTIVE 🛑 (1 open)"));
        assert!(body.contains("Members: a:80 (core), b:80 (-)"));
        assert!(body.contains("Clear streak: clear for 15s of 60s"));
        assert!(body.contains("cooling down, 15s left"));
        assert!(body.contains("Last tick: clear at"));
    }
}
