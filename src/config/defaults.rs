use super::schema::{Alerts, Backend, Chart, Guard, IndeterminatePolicy, SessionMode};

pub(super) fn default_command_timeout_secs() -> u64 {
    30
}

pub(super) fn default_backend_base_url() -> String {
    "http://localhost:9090".to_string()
}

pub(super) fn default_backend_job() -> String {
    "blackbox_ping".to_string()
}

pub(super) fn default_target_label() -> String {
    "instance".to_string()
}

pub(super) fn default_alias_label() -> String {
    "alias".to_string()
}

pub(super) fn default_query_timeout_secs() -> u64 {
    15
}

pub(super) fn default_report_timeout_secs() -> u64 {
    13 * 60
}

pub(super) fn default_down_threshold() -> f64 {
    5.0
}

pub(super) fn default_cooldown_secs() -> u64 {
    60
}

pub(super) fn default_clear_period_secs() -> u64 {
    60
}

pub(super) fn default_poll_interval_ms() -> u64 {
    3000
}

pub(super) fn default_session_mode() -> SessionMode {
    SessionMode::Global
}

pub(super) fn default_indeterminate_policy() -> IndeterminatePolicy {
    IndeterminatePolicy::Hold
}

pub(super) fn default_fail_threshold() -> u32 {
    5
}

pub(super) fn default_min_samples() -> u32 {
    5
}

pub(super) fn default_inner_resolution() -> String {
    "1s".to_string()
}

pub(super) fn default_chart_enabled() -> bool {
    true
}

pub(super) fn default_chart_render_timeout_secs() -> u64 {
    10
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: default_backend_base_url(),
            job: default_backend_job(),
            target_label: default_target_label(),
            alias_label: default_alias_label(),
            alert_query: None,
            query_timeout_secs: default_query_timeout_secs(),
            report_timeout_secs: default_report_timeout_secs(),
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            down_threshold: default_down_threshold(),
            cooldown_secs: default_cooldown_secs(),
            clear_period_secs: default_clear_period_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            mode: default_session_mode(),
            indeterminate: default_indeterminate_policy(),
        }
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self {
            fail_threshold: default_fail_threshold(),
            min_samples: default_min_samples(),
            inner_resolution: default_inner_resolution(),
        }
    }
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            enabled: default_chart_enabled(),
            render_timeout_secs: default_chart_render_timeout_secs(),
        }
    }
}
