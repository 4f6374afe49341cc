use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify, RwLock, Semaphore};

use crate::aggregation::ProbeQueries;
use crate::config::{Config, RuntimeConfig};
use crate::monitor::{MonitorState, PrometheusClient};

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub runtime_update_notify: Arc<Notify>,
    pub config_path: String,
    pub monitor_state: Arc<Mutex<MonitorState>>,
    pub last_monitor_tick: Arc<Mutex<Option<DateTime<Utc>>>>,
    pub command_slots: Arc<Semaphore>,
    pub source: PrometheusClient,
    pub queries: Arc<ProbeQueries>,
}

impl AppContext {
    pub fn new(
        config: Config,
        command_concurrency: usize,
        config_path: impl Into<String>,
        source: PrometheusClient,
    ) -> Self {
        let runtime_config = RuntimeConfig::from_config(&config);
        let monitor_state = MonitorState::new(config.alerts.mode, config.alerts.cooldown_secs);
        let queries = ProbeQueries::from_backend(&config.backend);

        Self {
            config,
            runtime_config: Arc::new(RwLock::new(runtime_config)),
            runtime_update_notify: Arc::new(Notify::new()),
            config_path: config_path.into(),
            monitor_state: Arc::new(Mutex::new(monitor_state)),
            last_monitor_tick: Arc::new(Mutex::new(None)),
            command_slots: Arc::new(Semaphore::new(command_concurrency)),
            source,
            queries: Arc::new(queries),
        }
    }

    /// Swaps the runtime config and wakes the monitor loop so a new poll
    /// interval applies without waiting out the old one.
    pub async fn update_runtime_config(&self, runtime_config: RuntimeConfig) {
        {
            let mut current = self.runtime_config.write().await;
            *current = runtime_config;
        }
        self.runtime_update_notify.notify_waiters();
    }
}
