use teloxide::types::{ChatId, UserId};
use thiserror::Error;

use super::schema::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

const MIN_POLL_INTERVAL_MS: u64 = 500;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bot_token must not be empty".to_string(),
            ));
        }
        if self.owner_id == 0 {
            return Err(ConfigError::Validation(
                "owner_id must be a positive integer".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "command_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let backend = &self.backend;
        if !(backend.base_url.starts_with("http://") || backend.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "backend.base_url must start with http:// or https://".to_string(),
            ));
        }
        for (name, value) in [
            ("backend.job", &backend.job),
            ("backend.target_label", &backend.target_label),
            ("backend.alias_label", &backend.alias_label),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{} must not be empty", name)));
            }
        }
        if let Some(query) = backend.alert_query.as_deref()
            && query.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "backend.alert_query must not be blank when set".to_string(),
            ));
        }
        if backend.query_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "backend.query_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if backend.report_timeout_secs < backend.query_timeout_secs {
            return Err(ConfigError::Validation(
                "backend.report_timeout_secs must not be shorter than backend.query_timeout_secs"
                    .to_string(),
            ));
        }

        if !self.alerts.down_threshold.is_finite() || self.alerts.down_threshold <= 0.0 {
            return Err(ConfigError::Validation(
                "alerts.down_threshold must be a positive number".to_string(),
            ));
        }
        if self.alerts.cooldown_secs == 0 {
            return Err(ConfigError::Validation(
                "alerts.cooldown_secs must be greater than 0".to_string(),
            ));
        }
        if self.alerts.clear_period_secs == 0 {
            return Err(ConfigError::Validation(
                "alerts.clear_period_secs must be greater than 0".to_string(),
            ));
        }
        if self.alerts.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::Validation(format!(
                "alerts.poll_interval_ms must be at least {}",
                MIN_POLL_INTERVAL_MS
            )));
        }

        if self.guard.fail_threshold == 0 {
            return Err(ConfigError::Validation(
                "guard.fail_threshold must be greater than 0".to_string(),
            ));
        }
        if self.guard.min_samples == 0 {
            return Err(ConfigError::Validation(
                "guard.min_samples must be greater than 0".to_string(),
            ));
        }
        if !is_promql_duration(&self.guard.inner_resolution) {
            return Err(ConfigError::Validation(
                "guard.inner_resolution must look like 1s, 5s or 1m".to_string(),
            ));
        }

        if self.chart.render_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "chart.render_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn owner_chat_id(&self) -> Result<ChatId, ConfigError> {
        if self.owner_id == 0 {
            return Err(ConfigError::Validation(
                "owner_id must be a positive integer".to_string(),
            ));
        }

        let chat_id = i64::try_from(self.owner_id).map_err(|_| {
            ConfigError::Validation("owner_id is too large to fit Telegram chat id".to_string())
        })?;
        Ok(ChatId(chat_id))
    }

    pub fn owner_user_id(&self) -> Result<UserId, ConfigError> {
        if self.owner_id == 0 {
            return Err(ConfigError::Validation(
                "owner_id must be a positive integer".to_string(),
            ));
        }

        Ok(UserId(self.owner_id))
    }

    /// Channel that receives outage alerts and recovery reports.
    pub fn alert_chat_id(&self) -> Result<ChatId, ConfigError> {
        match self.alert_chat_id {
            Some(chat_id) => Ok(ChatId(chat_id)),
            None => self.owner_chat_id(),
        }
    }
}

fn is_promql_duration(value: &str) -> bool {
    let value = value.trim();
    if value.len() < 2 {
        return false;
    }

    let (number_part, unit_part) = value.split_at(value.len() - 1);
    matches!(unit_part, "s" | "m")
        && number_part
            .parse::<u32>()
            .map(|number| number > 0)
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::is_promql_duration;
    use crate::config::{Alerts, Backend, Chart, Config, Guard};

    fn base_config() -> Config {
        Config {
            bot_token: "123456:abc".to_string(),
            owner_id: 42,
            alert_chat_id: None,
            command_timeout_secs: 30,
            backend: Backend::default(),
            alerts: Alerts::default(),
            guard: Guard::default(),
            chart: Chart::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn alert_chat_falls_back_to_owner() {
        let mut config = base_config();
        assert_eq!(config.alert_chat_id().expect("owner chat").0, 42);

        config.alert_chat_id = Some(-1001234);
        assert_eq!(config.alert_chat_id().expect("channel").0, -1001234);
    }

    #[test]
    fn rejects_nonsensical_values() {
        let mut config = base_config();
        config.alerts.poll_interval_ms = 100;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.guard.min_samples = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.backend.base_url = "localhost:9090".to_string();
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.alerts.down_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.backend.report_timeout_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inner_resolution_format() {
        assert!(is_promql_duration("1s"));
        assert!(is_promql_duration("15s"));
        assert!(is_promql_duration("1m"));
        assert!(!is_promql_duration("0s"));
        assert!(!is_promql_duration("1h"));
        assert!(!is_promql_duration("s"));
    }
}
