use teloxide::prelude::*;

use crate::app_context::AppContext;

use super::command_def::PingCommands;
use super::features::{
    errors::{handle_errorrange, handle_errors, handle_errorsince},
    health::{handle_health, handle_help},
    session::handle_session,
};

pub(super) async fn route_command(
    bot: Bot,
    msg: Message,
    cmd: PingCommands,
    app_context: &AppContext,
) -> ResponseResult<()> {
    match &cmd {
        PingCommands::Help => handle_help(&bot, &msg).await?,
        PingCommands::Health => handle_health(&bot, &msg, app_context).await?,
        PingCommands::Session => handle_session(&bot, &msg, app_context).await?,
        PingCommands::Errors => handle_errors(&bot, &msg, app_context, &cmd).await?,
        PingCommands::Errorsince(args) => {
            handle_errorsince(&bot, &msg, app_context, &cmd, args).await?
        }
        PingCommands::Errorrange(args) => {
            handle_errorrange(&bot, &msg, app_context, &cmd, args).await?
        }
    }

    Ok(())
}
