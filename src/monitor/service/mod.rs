mod chart;
mod core;
mod recovery;
mod snapshot;

pub use core::{TickDeps, check_targets};
pub use snapshot::monitor_snapshot;
