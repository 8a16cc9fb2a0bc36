use std::fs;
use std::path::Path as StdPath;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub naming_host: String,
    pub naming_registration_port: u16,
    pub service_port: u16,
    pub command_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming_host: "127.0.0.1".to_string(),
            naming_registration_port: 2048,
            service_port: 0,
            command_port: 0,
        }
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
