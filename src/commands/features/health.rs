use chrono::{DateTime, Utc};
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands};

use crate::app_context::AppContext;

use super::super::{command_def::PingCommands, helpers::as_html_block};

pub(crate) async fn handle_help(bot: &Bot, msg: &Message) -> ResponseResult<()> {
    bot.send_message(
        msg.chat.id,
        as_html_block(
            "Available commands",
            &PingCommands::descriptions().to_string(),
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    Ok(())
}

pub(crate) async fn handle_health(
    bot: &Bot,
    msg: &Message,
    app_context: &AppContext,
) -> ResponseResult<()> {
    let poll_interval_ms = app_context.runtime_config.read().await.alerts.poll_interval_ms;
    let last_tick = *app_context.last_monitor_tick.lock().await;

    let body = health_body(last_tick, Utc::now(), poll_interval_ms);
    bot.send_message(msg.chat.id, as_html_block("Bot Health", &body))
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

fn health_body(last_tick: Option<DateTime<Utc>>, now: DateTime<Utc>, poll_interval_ms: u64) -> String {
    let threshold_ms = i64::try_from(poll_interval_ms.saturating_mul(2)).unwrap_or(i64::MAX);

    match last_tick {
        Some(tick) => {
            let lag_ms = now.signed_duration_since(tick).num_milliseconds().max(0);
            let status_line = if lag_ms > threshold_ms {
                format!(
                    "⚠️ CRITICAL: Monitor loop is delayed. Last tick: {}ms ago (threshold: {}ms)",
                    lag_ms, threshold_ms
                )
            } else {
                format!(
                    "✅ Healthy. Last monitor tick: {}ms ago (threshold: {}ms)",
                    lag_ms, threshold_ms
                )
            };

            format!(
                "{}\n\nPoll interval: {}ms\nCurrent time: {}\nLast tick: {}",
                status_line,
                poll_interval_ms,
                now.to_rfc3339(),
                tick.to_rfc3339()
            )
        }
        None => format!(
            "⏳ Warming up...\n\nMonitor loop has not produced the first tick yet.\nPoll interval: {}ms\nCurrent time: {}",
            poll_interval_ms,
            now.to_rfc3339()
        ),
    }
}
