use chrono::Utc;
use teloxide::prelude::*;
use tokio::time::{Duration, sleep};

use crate::app_context::AppContext;
use crate::monitor::{TickDeps, check_targets};
use crate::notify::TelegramSink;

pub(super) fn start_monitor_job(bot: Bot, app_context: AppContext) {
    tokio::spawn(async move {
        let chat_id = match app_context.config.alert_chat_id() {
            Ok(chat_id) => chat_id,
            Err(error) => {
                log::error!("monitor job disabled: invalid alert chat: {}", error);
                return;
            }
        };
        let sink = TelegramSink::new(bot, chat_id);
        let deps = TickDeps {
            source: &app_context.source,
            sink: &sink,
            queries: app_context.queries.as_ref(),
            query_timeout_secs: app_context.config.backend.query_timeout_secs,
        };
        let mut previous_tick = None;

        log::info!(
            "monitor_job_started mode={} chat_id={} poll_interval_ms={}",
            app_context.config.alerts.mode.as_str(),
            chat_id.0,
            app_context.config.alerts.poll_interval_ms
        );

        loop {
            let runtime_config = app_context.runtime_config.read().await.clone();
            let now = Utc::now();
            let poll_interval_ms = runtime_config.alerts.poll_interval_ms;

            if let Some(previous) = previous_tick {
                let elapsed_ms = now.signed_duration_since(previous).num_milliseconds().max(0);
                let threshold_ms = i64::try_from(poll_interval_ms.saturating_mul(2)).unwrap_or(i64::MAX);
                if elapsed_ms > threshold_ms {
                    log::warn!(
                        "monitor_loop_delayed elapsed_ms={} threshold_ms={}",
                        elapsed_ms,
                        threshold_ms
                    );
                }
            }

            previous_tick = Some(now);

            {
                let mut tick = app_context.last_monitor_tick.lock().await;
                *tick = Some(now);
            }

            check_targets(&deps, &runtime_config, &app_context.monitor_state, now).await;

            let sleep_duration = Duration::from_millis(poll_interval_ms);
            tokio::select! {
                _ = sleep(sleep_duration) => {}
                _ = app_context.runtime_update_notify.notified() => {
                    log::info!(
                        "monitor_interval_change_interrupt_applied previous_sleep_ms={}",
                        poll_interval_ms
                    );
                }
            }
        }
    });
}
