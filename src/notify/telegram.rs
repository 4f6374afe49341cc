use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

use crate::monitor::display_alias;

use super::{AlertRecord, NotificationSink, SinkError};

const TELEGRAM_TEXT_SAFE_LIMIT: usize = 3900;
const TELEGRAM_CAPTION_LIMIT: usize = 1024;

/// Sends notifications to one Telegram chat.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramSink {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

impl NotificationSink for TelegramSink {
    async fn send_text(&self, text: &str) -> Result<(), SinkError> {
        if text.trim().is_empty() {
            return Err(SinkError::Rejected("empty notification text".to_string()));
        }
        if text.len() <= TELEGRAM_TEXT_SAFE_LIMIT {
            self.bot.send_message(self.chat_id, text).await?;
            return Ok(());
        }

        let head: String = text.lines().next().unwrap_or_default().to_string();
        self.bot
            .send_message(self.chat_id, format!("{head}\n(full text attached)"))
            .await?;
        self.bot
            .send_document(
                self.chat_id,
                InputFile::memory(text.as_bytes().to_vec()).file_name("notification.txt"),
            )
            .await?;
        Ok(())
    }

    async fn send_alert(&self, alert: &AlertRecord) -> Result<(), SinkError> {
        self.bot
            .send_message(self.chat_id, alert_html(alert))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_chart(
        &self,
        png: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<(), SinkError> {
        let photo = InputFile::memory(png).file_name(file_name.to_string());
        if caption.chars().count() <= TELEGRAM_CAPTION_LIMIT {
            self.bot
                .send_photo(self.chat_id, photo)
                .caption(caption)
                .await?;
            return Ok(());
        }

        self.bot.send_photo(self.chat_id, photo).await?;
        self.send_text(caption).await
    }
}

fn alert_html(alert: &AlertRecord) -> String {
    format!(
        "<b>🛑 PING ALERT</b>\nTarget: <code>{}</code>\nAlias: {}\nFailures/min: {:.0}\nObserved: {}",
        html_escape::encode_text(&alert.target),
        html_escape::encode_text(display_alias(&alert.alias)),
        alert.failures_per_minute,
        alert.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
