use serde::Deserialize;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bot_token: String,
    pub owner_id: u64,
    #[serde(default)]
    pub alert_chat_id: Option<i64>,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub alerts: Alerts,
    #[serde(default)]
    pub guard: Guard,
    #[serde(default)]
    pub chart: Chart,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub alerts: Alerts,
    pub guard: Guard,
    pub chart: Chart,
    pub command_timeout_secs: u64,
}

impl RuntimeConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            alerts: config.alerts.clone(),
            guard: config.guard.clone(),
            chart: config.chart.clone(),
            command_timeout_secs: config.command_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    #[serde(default = "default_backend_base_url")]
    pub base_url: String,
    #[serde(default = "default_backend_job")]
    pub job: String,
    #[serde(default = "default_target_label")]
    pub target_label: String,
    #[serde(default = "default_alias_label")]
    pub alias_label: String,
    #[serde(default)]
    pub alert_query: Option<String>,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_report_timeout_secs")]
    pub report_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Global,
    PerTarget,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerTarget => "per_target",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndeterminatePolicy {
    Hold,
    TreatAsClear,
}

impl IndeterminatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::TreatAsClear => "treat_as_clear",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alerts {
    #[serde(default = "default_down_threshold")]
    pub down_threshold: f64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_clear_period_secs")]
    pub clear_period_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_session_mode")]
    pub mode: SessionMode,
    #[serde(default = "default_indeterminate_policy")]
    pub indeterminate: IndeterminatePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Guard {
    #[serde(default = "default_fail_threshold")]
    pub fail_threshold: u32,
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,
    #[serde(default = "default_inner_resolution")]
    pub inner_resolution: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    #[serde(default = "default_chart_enabled")]
    pub enabled: bool,
    #[serde(default = "default_chart_render_timeout_secs")]
    pub render_timeout_secs: u64,
}
