mod evaluator;
mod prometheus;
mod service;
mod source;
mod state;

pub use prometheus::PrometheusClient;
pub use service::{TickDeps, check_targets, monitor_snapshot};
pub use source::{BackendError, MetricSource, TimestampedValue, display_alias, with_timeout};
pub use state::{MonitorSnapshot, MonitorState, SessionSnapshot};

#[cfg(test)]
pub(crate) use source::{ProbeResult, mock};
#[cfg(test)]
pub(crate) use state::TickKind;
