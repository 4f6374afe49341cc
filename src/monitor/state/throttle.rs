use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Throttle key shared by every global-mode alert.
pub const GLOBAL_THROTTLE_KEY: &str = "global";

/// Per-key cooldown ledger for outgoing alerts.
#[derive(Debug, Default)]
pub struct NotificationThrottle {
    cooldown_secs: u64,
    last_sent: HashMap<String, i64>,
}

impl NotificationThrottle {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown_secs,
            last_sent: HashMap::new(),
        }
    }

    pub fn set_cooldown(&mut self, cooldown_secs: u64) {
        self.cooldown_secs = cooldown_secs;
    }

    /// Returns true and records `now` when the key has never fired or its
    /// cooldown has fully elapsed. Otherwise leaves the ledger untouched.
    pub fn should_notify(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let now_secs = now.timestamp();
        if !should_send_alert(self.last_sent.get(key).copied(), self.cooldown_secs, now_secs) {
            return false;
        }

        self.last_sent.insert(key.to_string(), now_secs);
        true
    }

    pub fn last_sent(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_sent
            .get(key)
            .and_then(|secs| DateTime::from_timestamp(*secs, 0))
    }
}

fn should_send_alert(last_sent: Option<i64>, cooldown_secs: u64, now_secs: i64) -> bool {
    match last_sent {
        None => true,
        Some(last) => now_secs.saturating_sub(last) >= cooldown_secs as i64,
    }
}
