use std::fs;
use std::path::Path as StdPath;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub service_port: u16,
    pub registration_port: u16,
    pub replication_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { service_port: 2049, registration_port: 2048, replication_factor: crate::monitor::DEFAULT_REPLICATION_ALPHA }
    }
}

pub fn load_config(path: &StdPath) -> Config {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        return Config::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read config file, using defaults");
            return Config::default();
        }
    };

    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not parse config file, using defaults");
            Config::default()
        }
    }
}
