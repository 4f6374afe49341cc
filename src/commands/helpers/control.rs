use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::formatting::as_html_block;
use crate::commands::command_def::PingCommands;
use crate::config::Config;

const FAST_TIMEOUT_SECS: u64 = 5;
const TELEGRAM_FILE_FALLBACK_THRESHOLD: usize = 3600;

/// Upper bound for one command. Report commands wait on heavy backend
/// aggregation; everything else only reads local state.
pub(crate) fn timeout_for(cmd: &PingCommands, config: &Config) -> u64 {
    match cmd {
        PingCommands::Help | PingCommands::Health | PingCommands::Session => FAST_TIMEOUT_SECS,
        PingCommands::Errors | PingCommands::Errorsince(_) | PingCommands::Errorrange(_) => {
            config.backend.report_timeout_secs
        }
    }
}

pub(crate) async fn acquire_command_slot(
    command_slots: &Arc<Semaphore>,
    msg: &Message,
    bot: &Bot,
) -> ResponseResult<Option<OwnedSemaphorePermit>> {
    match command_slots.clone().acquire_owned().await {
        Ok(permit) => Ok(Some(permit)),
        Err(error) => {
            log::error!("failed to acquire command semaphore: {}", error);
            bot.send_message(
                msg.chat.id,
                as_html_block(
                    "Command queue error",
                    "Could not acquire command slot. Please try again.",
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            Ok(None)
        }
    }
}

/// Sends `body` as a `<pre>` block, or as a text attachment when it would not
/// fit in one message.
pub(crate) async fn send_html_or_file(
    bot: &Bot,
    chat_id: ChatId,
    title: &str,
    body: &str,
) -> ResponseResult<()> {
    let escaped_len = html_escape::encode_text(body).len();
    if escaped_len <= TELEGRAM_FILE_FALLBACK_THRESHOLD {
        bot.send_message(chat_id, as_html_block(title, body))
            .parse_mode(ParseMode::Html)
            .await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        as_html_block(title, "Report is too long for one message. Sent as file attachment."),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    bot.send_document(
        chat_id,
        InputFile::memory(body.as_bytes().to_vec()).file_name(report_file_name(title)),
    )
    .await?;

    Ok(())
}

fn report_file_name(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}.txt", slug.trim_matches('-'))
}

#[cfg(test)]
mod tests {
    use super::{report_file_name, timeout_for};
    use crate::commands::command_def::PingCommands;
    use crate::config::{Backend, Config};

    fn config() -> Config {
        Config {
            bot_token: "token".to_string(),
            owner_id: 1,
            alert_chat_id: None,
            command_timeout_secs: 30,
            backend: Backend::default(),
            alerts: Default::default(),
            guard: Default::default(),
            chart: Default::default(),
        }
    }

    #[test]
    fn report_commands_get_report_budget() {
        let config = config();
        assert_eq!(timeout_for(&PingCommands::Health, &config), 5);
        assert_eq!(timeout_for(&PingCommands::Errors, &config), 780);
        assert_eq!(timeout_for(&PingCommands::Errorrange(String::new()), &config), 780);
    }

    #[test]
    fn file_names_are_slugged() {
        assert_eq!(report_file_name("Error minutes / since P1D"), "error-minutes---since-p1d.txt");
    }
}
