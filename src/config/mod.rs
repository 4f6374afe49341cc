mod defaults;
mod io;
mod schema;
mod validate;

pub use io::{config_path, load_config};
pub use validate::ConfigError;
pub use schema::{
    Alerts, Backend, Chart, Config, Guard, IndeterminatePolicy, RuntimeConfig, SessionMode,
};
