use std::path::Path;
use std::time::Duration;

use notify::{Config as NotifyConfig, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::time::sleep;

use crate::app_context::AppContext;
use crate::config::{ConfigError, RuntimeConfig, load_config};

const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

async fn apply_runtime_reload_from_path(
    app_context: &AppContext,
    config_path: &str,
) -> Result<RuntimeConfig, ConfigError> {
    let new_config = load_config(config_path)?;
    let runtime_config = RuntimeConfig::from_config(&new_config);
    app_context.update_runtime_config(runtime_config.clone()).await;
    Ok(runtime_config)
}

fn is_reload_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    )
}

pub(super) fn start_config_hot_reload_job(app_context: AppContext) {
    tokio::spawn(async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let config_path = app_context.config_path.clone();
        let mut watcher = match RecommendedWatcher::new(
            move |result| {
                let _ = tx.send(result);
            },
            NotifyConfig::default(),
        ) {
            Ok(watcher) => watcher,
            Err(error) => {
                log::warn!("config hot-reload disabled: watcher init failed: {}", error);
                return;
            }
        };

        if let Err(error) = watcher.watch(Path::new(config_path.as_str()), RecursiveMode::NonRecursive)
        {
            log::warn!(
                "config hot-reload disabled: failed to watch {}: {}",
                config_path,
                error
            );
            return;
        }

        while let Some(event_result) = rx.recv().await {
            match event_result {
                Ok(event) if is_reload_event(&event.kind) => {}
                Ok(_) => continue,
                Err(error) => {
                    log::warn!("config hot-reload event error: {}", error);
                    continue;
                }
            }

            // editors save in bursts (truncate, write, rename)
            sleep(RELOAD_DEBOUNCE).await;
            let mut coalesced = 0usize;
            while rx.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                log::debug!("config_hot_reload_coalesced events={}", coalesced);
            }

            match apply_runtime_reload_from_path(&app_context, config_path.as_str()).await {
                Ok(runtime_config) => {
                    let alerts = &runtime_config.alerts;
                    log::info!(
                        "config_hot_reload_applied target=runtime down_threshold={} cooldown_secs={} clear_period_secs={} poll_interval_ms={} indeterminate={} fail_threshold={} min_samples={} inner_resolution={} chart_enabled={} command_timeout_secs={}",
                        alerts.down_threshold,
                        alerts.cooldown_secs,
                        alerts.clear_period_secs,
                        alerts.poll_interval_ms,
                        alerts.indeterminate.as_str(),
                        runtime_config.guard.fail_threshold,
                        runtime_config.guard.min_samples,
                        runtime_config.guard.inner_resolution,
                        runtime_config.chart.enabled,
                        runtime_config.command_timeout_secs,
                    );

                    let running_mode = app_context.config.alerts.mode;
                    if alerts.mode != running_mode {
                        log::warn!(
                            "config_hot_reload_partial field=alerts.mode running={} configured={} reason=restart_required",
                            running_mode.as_str(),
                            alerts.mode.as_str()
                        );
                    }
                }
                Err(error) => {
                    log::warn!("config hot-reload ignored invalid config: {}", error);
                }
            }
        }
    });
}
