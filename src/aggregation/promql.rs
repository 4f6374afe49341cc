use chrono::{DateTime, Utc};

use crate::config::Backend;

use super::GuardThresholds;

const MINUTE_STEP: &str = "1m";

/// Builds the probe expressions for one blackbox job.
#[derive(Debug, Clone)]
pub struct ProbeQueries {
    selector: String,
    group_by: String,
    alert_override: Option<String>,
}

impl ProbeQueries {
    pub fn from_backend(backend: &Backend) -> Self {
        Self {
            selector: format!(
                "probe_success{{job=\"{}\"}}",
                escape_label_value(&backend.job)
            ),
            group_by: format!("{}, {}", backend.target_label, backend.alias_label),
            alert_override: backend
                .alert_query
                .as_deref()
                .map(str::trim)
                .filter(|query| !query.is_empty())
                .map(str::to_string),
        }
    }

    /// Failed probes in the trailing minute, per target. Drives the poll tick.
    pub fn failures_per_minute(&self) -> String {
        if let Some(query) = &self.alert_override {
            return query.clone();
        }

        format!(
            "sum by ({group}) (count_over_time({sel}[1m]) - sum_over_time({sel}[1m]))",
            group = self.group_by,
            sel = self.selector,
        )
    }

    /// Per target and minute: 1 when the minute is down, 0 when it is
    /// healthy, absent when too few samples were scraped to judge it.
    pub fn down_minute(&self, guard: &GuardThresholds, inner_resolution: &str) -> String {
        format!(
            "((sum_over_time(({sel} == bool 0)[1m:{res}]) >= bool {fails}) and (count_over_time({sel}[1m:{res}]) >= {samples}))",
            sel = self.selector,
            res = inner_resolution,
            fails = guard.fail_threshold,
            samples = guard.min_samples,
        )
    }

    /// Guarded down minutes per target over `range_secs` ending at `end`.
    pub fn guarded_minutes(
        &self,
        guard: &GuardThresholds,
        inner_resolution: &str,
        range_secs: i64,
        end: DateTime<Utc>,
    ) -> String {
        format!(
            "sum by ({group}) (sum_over_time({down}[{range_secs}s:{MINUTE_STEP}] @ {end}))",
            group = self.group_by,
            down = self.down_minute(guard, inner_resolution),
            end = end.timestamp(),
        )
    }

    /// Minutes in which at least one target was down; targets are
    /// collapsed with `max by ()` so overlapping outages count once.
    pub fn any_down_minutes(
        &self,
        guard: &GuardThresholds,
        inner_resolution: &str,
        range_secs: i64,
        end: DateTime<Utc>,
    ) -> String {
        format!(
            "sum_over_time((max by () ({down}))[{range_secs}s:{MINUTE_STEP}] @ {end})",
            down = self.down_minute(guard, inner_resolution),
            end = end.timestamp(),
        )
    }
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::ProbeQueries;
    use crate::aggregation::GuardThresholds;
    use crate::config::Backend;

    fn queries() -> ProbeQueries {
        ProbeQueries::from_backend(&Backend::default())
    }

    #[test]
    fn tick_query_counts_failed_probes_per_target() {
        assert_eq!(
            queries().failures_per_minute(),
            "sum by (instance, alias) (count_over_time(probe_success{job=\"blackbox_ping\"}[1m]) - sum_over_time(probe_success{job=\"blackbox_ping\"}[1m]))"
        );
    }

    #[test]
    fn alert_query_override_wins() {
        let backend = Backend {
            alert_query: Some("  my_failures_per_minute  ".to_string()),
            ..Backend::default()
        };
        let queries = ProbeQueries::from_backend(&backend);
        assert_eq!(queries.failures_per_minute(), "my_failures_per_minute");
        assert!(
            queries
                .down_minute(&GuardThresholds::default(), "1s")
                .contains("count_over_time")
        );
    }

    #[test]
    fn guarded_query_carries_both_guards_and_window() {
        let end = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).single().expect("valid time");
        let guard = GuardThresholds {
            fail_threshold: 5,
            min_samples: 7,
        };
        let query = queries().guarded_minutes(&guard, "1s", 3600, end);

        assert!(query.starts_with("sum by (instance, alias) (sum_over_time("));
        assert!(query.contains("== bool 0)[1m:1s]) >= bool 5)"));
        assert!(query.contains("and (count_over_time(probe_success{job=\"blackbox_ping\"}[1m:1s]) >= 7)"));
        assert!(query.contains(&format!("[3600s:1m] @ {}", end.timestamp())));
    }

    #[test]
    fn any_down_query_collapses_targets() {
        let end = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).single().expect("valid time");
        let query = queries().any_down_minutes(&GuardThresholds::default(), "1s", 600, end);

        assert!(query.starts_with("sum_over_time((max by () ("));
        assert!(!query.contains("sum by"));
        assert!(query.ends_with(&format!("[600s:1m] @ {})", end.timestamp())));
    }

    #[test]
    fn job_label_is_escaped() {
        let backend = Backend {
            job: "ping \"lan\"".to_string(),
            ..Backend::default()
        };
        let query = ProbeQueries::from_backend(&backend).failures_per_minute();
        assert!(query.contains("probe_success{job=\"ping \\\"lan\\\"\"}"));
    }
}
