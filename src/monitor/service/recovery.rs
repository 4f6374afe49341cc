use std::fmt::Display;

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Utc};
use thiserror::Error;

use crate::aggregation::{GuardedMinuteQuery, MinuteAggregator, ProbeQueries, TargetMinutes};
use crate::config::{Chart, Guard, SessionMode};
use crate::notify::NotificationSink;

use super::super::source::{
    BackendError, MetricSource, QueryRange, alias_matches, display_alias, with_timeout,
};
use super::super::state::ClosedSession;
use super::chart::{ChartRenderError, ChartSeries, run_render_task};

const NO_CHART_NOTE: &str = "(no chart data)";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Chart(#[from] ChartRenderError),
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(error) => error.code(),
            Self::Chart(error) => error.code(),
        }
    }
}

/// Backend handles the recovery report needs.
pub(crate) struct ReportInputs<'a, S> {
    pub(crate) source: &'a S,
    pub(crate) queries: &'a ProbeQueries,
    pub(crate) query_timeout_secs: u64,
}

#[derive(Debug, Clone)]
struct MemberMinutes {
    target: String,
    alias: String,
    guarded: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct SessionMinutes {
    members: Vec<MemberMinutes>,
    any_down: u64,
}

/// Guarded down minutes of every session member over `[start, end)`,
/// evaluated by the backend like the `/errorrange` report.
pub(crate) async fn collect_session_minutes<S: MetricSource>(
    inputs: &ReportInputs<'_, S>,
    guard: &Guard,
    mode: SessionMode,
    closed: &ClosedSession,
) -> Result<SessionMinutes, BackendError> {
    let aggregator = MinuteAggregator::new(inputs.source, inputs.queries, guard);
    let window = GuardedMinuteQuery::new(closed.session.start, closed.end);

    let rows = with_timeout(
        inputs.query_timeout_secs,
        aggregator.per_target_minutes(window),
    )
    .await?;

    let members: Vec<MemberMinutes> = closed
        .session
        .members
        .iter()
        .map(|target| {
            let alias = closed.session.alias_of(target);
            MemberMinutes {
                target: target.clone(),
                alias: alias.to_string(),
                guarded: member_minutes(&rows, target, alias),
            }
        })
        .collect();

    let any_down = match mode {
        SessionMode::Global => {
            with_timeout(
                inputs.query_timeout_secs,
                aggregator.any_down_minutes(window),
            )
            .await?
        }
        SessionMode::PerTarget => members.iter().map(|member| member.guarded).max().unwrap_or(0),
    };

    Ok(SessionMinutes { members, any_down })
}

/// Prefers the row carrying the member's alias; a target whose alias
/// changed mid-window falls back to its largest row.
fn member_minutes(rows: &[TargetMinutes], target: &str, alias: &str) -> u64 {
    let for_target = || rows.iter().filter(|row| row.target == target);
    for_target()
        .filter(|row| alias_matches(alias, Some(&row.alias)))
        .map(|row| row.minutes)
        .max()
        .or_else(|| for_target().map(|row| row.minutes).max())
        .unwrap_or(0)
}

/// Sends the recovery notification for a closed session. Never fails: every
/// error degrades to a plainer message and is logged.
pub(crate) async fn deliver_recovery<S: MetricSource, N: NotificationSink>(
    inputs: &ReportInputs<'_, S>,
    sink: &N,
    guard: &Guard,
    chart: &Chart,
    mode: SessionMode,
    closed: &ClosedSession,
) {
    let header = recovery_header(mode, closed);

    let minutes = match collect_session_minutes(inputs, guard, mode, closed).await {
        Ok(minutes) => minutes,
        Err(error) => {
            log::warn!(
                "recovery_report_failed code={} start={} end={} error={}",
                error.code(),
                closed.session.start.to_rfc3339(),
                closed.end.to_rfc3339(),
                error
            );
            send_text_logged(sink, &header).await;
            return;
        }
    };

    let caption = format!("{header}\n{}", minutes_line(&minutes));
    match render_session_chart(inputs, &minutes, chart, closed).await {
        Ok(Some(png)) => {
            let file_name = format!("ping-recovery-{}.png", closed.end.timestamp());
            if let Err(error) = sink.send_chart(png, &file_name, &caption).await {
                log::error!("recovery_chart_send_failed error={}", error);
            }
        }
        Ok(None) => send_text_logged(sink, &format!("{caption}\n{NO_CHART_NOTE}")).await,
        Err(error) => {
            log::warn!("recovery_chart_failed code={} error={}", error.code(), error);
            send_text_logged(sink, &format!("{caption}\n{NO_CHART_NOTE}")).await;
        }
    }
}

/// Per-minute failures of each member, plotted over the session.
async fn render_session_chart<S: MetricSource>(
    inputs: &ReportInputs<'_, S>,
    minutes: &SessionMinutes,
    chart: &Chart,
    closed: &ClosedSession,
) -> Result<Option<Vec<u8>>, ReportError> {
    if !chart.enabled {
        return Ok(None);
    }

    let range = QueryRange::per_minute(closed.session.start, closed.end);
    let expr = inputs.queries.failures_per_minute();
    let mut series = Vec::with_capacity(minutes.members.len());
    for member in &minutes.members {
        let points = with_timeout(
            inputs.query_timeout_secs,
            inputs
                .source
                .range_query(&expr, &range, &member.target, &member.alias),
        )
        .await?;
        series.push(ChartSeries {
            label: member_label(&member.target, &member.alias),
            points: points
                .iter()
                .map(|point| (point.timestamp, point.value))
                .collect(),
        });
    }

    if series.iter().map(|line| line.points.len()).sum::<usize>() < 2 {
        return Ok(None);
    }

    Ok(Some(run_render_task(series, chart.render_timeout_secs).await?))
}

async fn send_text_logged<N: NotificationSink>(sink: &N, text: &str) {
    if let Err(error) = sink.send_text(text).await {
        log::error!("recovery_send_failed error={}", error);
    }
}

pub(crate) fn recovery_header(mode: SessionMode, closed: &ClosedSession) -> String {
    let title = match mode {
        SessionMode::Global => "[PING RECOVERY] ALL TARGETS UP ✅".to_string(),
        SessionMode::PerTarget => {
            let target = closed
                .session
                .members
                .iter()
                .next()
                .map(|target| member_label(target, closed.session.alias_of(target)))
                .unwrap_or_default();
            format!("[PING RECOVERY] {target} UP ✅")
        }
    };

    let targets = closed
        .session
        .members
        .iter()
        .map(|target| member_label(target, closed.session.alias_of(target)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{title}\nDowntime: {}\nWindow: {} → {}\nTargets involved: {}",
        human_duration(closed.duration()),
        format_timestamp(closed.session.start, &Local),
        format_timestamp(closed.end, &Local),
        targets
    )
}

fn minutes_line(minutes: &SessionMinutes) -> String {
    let per_member = minutes
        .members
        .iter()
        .map(|member| format!("{}={}", member.target, member.guarded))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Guarded down minutes: {per_member} | any target: {}",
        minutes.any_down
    )
}

fn member_label(target: &str, alias: &str) -> String {
    match display_alias(alias) {
        "-" => target.to_string(),
        alias => format!("{alias} ({target})"),
    }
}

fn format_timestamp<Tz: TimeZone>(timestamp: DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: Display,
{
    timestamp
        .with_timezone(zone)
        .format("%Y-%m-%d %H:%M:%S %:z")
        .to_string()
}

pub(crate) fn human_duration(duration: ChronoDuration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
