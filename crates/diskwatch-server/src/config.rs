use serde::{Deserialize, Serialize};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/server.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_watchlist_path")]
    pub watchlist_path: String,
    /// Seconds between sampling ticks.
    #[serde(default = "default_log_interval_secs")]
    pub log_interval_secs: u64,
    /// Upper bound on one tick's snapshot-and-write work.
    #[serde(default = "default_tick_timeout_secs")]
    pub tick_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            database_path: default_database_path(),
            watchlist_path: default_watchlist_path(),
            log_interval_secs: default_log_interval_secs(),
            tick_timeout_secs: default_tick_timeout_secs(),
        }
    }
}

fn default_http_port() -> u16 {
    8192
}

fn default_database_path() -> String {
    "data/samples.db".to_string()
}

fn default_watchlist_path() -> String {
    "watchlist.txt".to_string()
}

fn default_log_interval_secs() -> u64 {
    900
}

fn default_tick_timeout_secs() -> u64 {
    60
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{path}': {e}"))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the config at `path`, falling back to built-in defaults when
    /// the file does not exist. Used for the default location only; an
    /// explicitly named config that is missing should be an error.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8192);
        assert_eq!(config.log_interval_secs, 900);
        assert_eq!(config.watchlist_path, "watchlist.txt");
    }

    #[test]
    fn partial_config_overrides_selectively() {
        let config: ServerConfig =
            toml::from_str("http_port = 9000\nlog_interval_secs = 60\n").unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.log_interval_secs, 60);
        assert_eq!(config.database_path, "data/samples.db");
    }
}
