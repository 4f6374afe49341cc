use std::path::Path;

use super::{schema::Config, validate::ConfigError};

const CONFIG_PATH_ENV: &str = "PING_OUTAGE_BOT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    parse_config(&raw, path_str)
}

fn parse_config(raw: &str, path: String) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(raw).map_err(|source| ConfigError::Parse { path, source })?;
    config.validate()?;
    Ok(config)
}
