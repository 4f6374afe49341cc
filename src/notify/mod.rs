//! Outbound notification channel for alerts and recovery reports.

use chrono::{DateTime, Utc};
use thiserror::Error;

mod telegram;

pub use telegram::TelegramSink;

/// One down target in per-target mode.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub target: String,
    pub alias: String,
    pub failures_per_minute: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

pub trait NotificationSink {
    async fn send_text(&self, text: &str) -> Result<(), SinkError>;

    async fn send_alert(&self, alert: &AlertRecord) -> Result<(), SinkError>;

    async fn send_chart(&self, png: Vec<u8>, file_name: &str, caption: &str)
    -> Result<(), SinkError>;
}
