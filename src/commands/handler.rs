use super::command_def::PingCommands;
use super::helpers::{is_authorized, log_unauthorized};
use super::router::route_command;
use crate::app_context::AppContext;
use teloxide::prelude::*;

pub async fn answer(
    bot: Bot,
    msg: Message,
    cmd: PingCommands,
    app_context: &AppContext,
) -> ResponseResult<()> {
    if !is_authorized(&msg, &app_context.config) {
        log_unauthorized(&msg, &app_context.config);
        return Ok(());
    }
    route_command(bot, msg, cmd, app_context).await
}
