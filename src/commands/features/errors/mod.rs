mod format;
mod parser;

use chrono::Local;
use teloxide::{prelude::*, types::ParseMode};
use tokio::time::{Duration, timeout};

use crate::app_context::AppContext;
use crate::reporting::{ReportWindow, ReportingFacade, standard_windows};

use super::super::command_def::PingCommands;
use super::super::helpers::{acquire_command_slot, as_html_block, send_html_or_file, timeout_for};
use format::{render_summary, render_window_result};
use parser::{ERRORRANGE_USAGE, ERRORSINCE_USAGE, parse_range_args, parse_since_args};

const REPORT_TITLE: &str = "Error minutes";

pub(crate) async fn handle_errors(
    bot: &Bot,
    msg: &Message,
    app_context: &AppContext,
    cmd: &PingCommands,
) -> ResponseResult<()> {
    let Some(_permit) = acquire_command_slot(&app_context.command_slots, msg, bot).await? else {
        return Ok(());
    };

    let guard = app_context.runtime_config.read().await.guard.clone();
    let budget_secs = timeout_for(cmd, &app_context.config);
    let facade = ReportingFacade::new(
        &app_context.source,
        app_context.queries.as_ref(),
        &guard,
        budget_secs,
    );

    let now = Local::now();
    let windows = standard_windows(&now);
    let started = std::time::Instant::now();
    let Ok(results) = timeout(Duration::from_secs(budget_secs), facade.fan_out(windows)).await else {
        log::warn!("errors_report_timeout budget_secs={}", budget_secs);
        return send_timeout(bot, msg, budget_secs).await;
    };

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    log::info!(
        "errors_report_done windows={} failed={} elapsed_ms={}",
        results.len(),
        failed,
        started.elapsed().as_millis()
    );

    let body = results
        .iter()
        .map(|(window, result)| render_window_result(window, result, &Local))
        .collect::<Vec<_>>()
        .join("\n\n");

    send_html_or_file(bot, msg.chat.id, REPORT_TITLE, &body).await
}

pub(crate) async fn handle_errorsince(
    bot: &Bot,
    msg: &Message,
    app_context: &AppContext,
    cmd: &PingCommands,
    args: &str,
) -> ResponseResult<()> {
    let now = Local::now();
    let window = match parse_since_args(args).and_then(|interval| {
        ReportWindow::since(&interval, &now).map_err(Into::into)
    }) {
        Ok(window) => window,
        Err(error) => {
            return send_usage(bot, msg, &format!("{error}\n\n{ERRORSINCE_USAGE}")).await;
        }
    };

    summarize_single(bot, msg, app_context, cmd, window).await
}

pub(crate) async fn handle_errorrange(
    bot: &Bot,
    msg: &Message,
    app_context: &AppContext,
    cmd: &PingCommands,
    args: &str,
) -> ResponseResult<()> {
    let (start, end) = match parse_range_args(args) {
        Ok(range) => range,
        Err(error) => {
            return send_usage(bot, msg, &format!("{error}\n\n{ERRORRANGE_USAGE}")).await;
        }
    };

    summarize_single(bot, msg, app_context, cmd, ReportWindow::absolute(start, end)).await
}

async fn summarize_single(
    bot: &Bot,
    msg: &Message,
    app_context: &AppContext,
    cmd: &PingCommands,
    window: ReportWindow,
) -> ResponseResult<()> {
    let Some(_permit) = acquire_command_slot(&app_context.command_slots, msg, bot).await? else {
        return Ok(());
    };

    let guard = app_context.runtime_config.read().await.guard.clone();
    let budget_secs = timeout_for(cmd, &app_context.config);
    let facade = ReportingFacade::new(
        &app_context.source,
        app_context.queries.as_ref(),
        &guard,
        budget_secs,
    );

    let body = match timeout(Duration::from_secs(budget_secs), facade.summarize(&window)).await {
        Ok(Ok(summary)) => render_summary(&summary, &Local),
        Ok(Err(error)) => {
            log::warn!(
                "errors_report_failed period={} code={} error={}",
                window.period,
                error.code(),
                error
            );
            render_window_result(&window, &Err(error), &Local)
        }
        Err(_) => {
            log::warn!(
                "errors_report_timeout period={} budget_secs={}",
                window.period,
                budget_secs
            );
            return send_timeout(bot, msg, budget_secs).await;
        }
    };

    send_html_or_file(bot, msg.chat.id, REPORT_TITLE, &body).await
}

async fn send_usage(bot: &Bot, msg: &Message, body: &str) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, as_html_block("Invalid arguments", body))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn send_timeout(bot: &Bot, msg: &Message, budget_secs: u64) -> ResponseResult<()> {
    bot.send_message(
        msg.chat.id,
        as_html_block(
            REPORT_TITLE,
            &format!("Report timed out after {budget_secs}s. Try a shorter window."),
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
