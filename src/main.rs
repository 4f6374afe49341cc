mod aggregation;
mod app_context;
mod commands;
mod config;
mod jobs;
mod monitor;
mod notify;
mod reporting;

use teloxide::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::app_context::AppContext;
use crate::commands::{PingCommands, answer};
use crate::config::{Config, config_path, load_config};
use crate::jobs::start_background_jobs;
use crate::monitor::PrometheusClient;

const COMMAND_CONCURRENCY: usize = 2;

fn init_json_logging() {
    if let Err(error) = tracing_log::LogTracer::init() {
        eprintln!(
            "logging bridge initialization failed (continuing with existing logger): {}",
            error
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", error);
    }
}

#[tokio::main]
async fn main() {
    init_json_logging();

    let path = config_path();
    let config: Config = match load_config(&path) {
        Ok(config) => config,
        Err(error) => {
            log::error!("Configuration error: {}", error);
            return;
        }
    };

    let source = match PrometheusClient::new(&config.backend) {
        Ok(source) => source,
        Err(error) => {
            log::error!("metric backend client error: code={} {}", error.code(), error);
            return;
        }
    };

    log::info!(
        "ping_outage_bot starting version={} backend={} job={} mode={}",
        env!("CARGO_PKG_VERSION"),
        config.backend.base_url,
        config.backend.job,
        config.alerts.mode.as_str()
    );

    let bot = Bot::new(&config.bot_token);
    let app_context = AppContext::new(config, COMMAND_CONCURRENCY, path, source);

    start_background_jobs(bot.clone(), app_context.clone());

    PingCommands::repl(bot, move |bot, msg, cmd| {
        let app_context = app_context.clone();
        async move { answer(bot, msg, cmd, &app_context).await }
    })
    .await;
}
