//! # Simulator Configuration
//!
//! Server address, board identity, sensor drift and client defaults, loaded
//! from a single TOML file. Every section and field is optional.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//!
//! [board]
//! name = "Arduino Uno R3"
//! firmware = "1.8.19"
//!
//! [drift]
//! interval_ms = 1000
//! temperature_step = 0.25
//! light_step = 20
//!
//! [client]
//! url = "ws://127.0.0.1:9000"
//! poll_interval_ms = 100
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A light step larger than the full ADC span is meaningless.
const MAX_LIGHT_STEP: i64 = 1023;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration struct for the server, board, drift task and client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Listening address of the WebSocket server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Identity reported in the greeting.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    #[serde(default = "default_board_name")]
    pub name: String,
    #[serde(default = "default_firmware")]
    pub firmware: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: default_board_name(),
            firmware: default_firmware(),
        }
    }
}

/// Background sensor drift.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriftConfig {
    #[serde(default = "default_drift_interval_ms")]
    pub interval_ms: u64,
    /// Largest temperature change per tick, in °C.
    #[serde(default = "default_temperature_step")]
    pub temperature_step: f64,
    /// Largest light change per tick, in raw ADC counts.
    #[serde(default = "default_light_step")]
    pub light_step: i64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_drift_interval_ms(),
            temperature_step: default_temperature_step(),
            light_step: default_light_step(),
        }
    }
}

impl DriftConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Defaults for the polling client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_url")]
    pub url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_client_url(),
            poll_interval_ms: default_poll_interval_ms(),
            startup_delay_ms: default_startup_delay_ms(),
        }
    }
}

impl Config {
    /// Reject values the server or client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }
        if self.drift.interval_ms == 0 {
            return Err(ConfigError::Invalid("drift.interval_ms must be > 0".to_string()));
        }
        if !self.drift.temperature_step.is_finite() || self.drift.temperature_step < 0.0 {
            return Err(ConfigError::Invalid(
                "drift.temperature_step must be a finite, non-negative number".to_string(),
            ));
        }
        if !(0..=MAX_LIGHT_STEP).contains(&self.drift.light_step) {
            return Err(ConfigError::Invalid(format!(
                "drift.light_step must be within 0..={}",
                MAX_LIGHT_STEP
            )));
        }
        if self.client.url.trim().is_empty() {
            return Err(ConfigError::Invalid("client.url must not be empty".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8765 }
fn default_board_name() -> String { "Arduino Uno R3".to_string() }
fn default_firmware() -> String { "1.8.19".to_string() }
fn default_drift_interval_ms() -> u64 { 5000 }
fn default_temperature_step() -> f64 { 0.5 }
fn default_light_step() -> i64 { 50 }
fn default_client_url() -> String { "ws://127.0.0.1:8765".to_string() }
fn default_poll_interval_ms() -> u64 { 500 }
fn default_startup_delay_ms() -> u64 { 2000 }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8765");
        assert_eq!(config.board.name, "Arduino Uno R3");
        assert_eq!(config.board.firmware, "1.8.19");
        assert_eq!(config.drift.interval(), Duration::from_secs(5));
        assert_eq!(config.drift.temperature_step, 0.5);
        assert_eq!(config.drift.light_step, 50);
        assert_eq!(config.client.poll_interval_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("sim.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[server]\nport = 9001\n\n[drift]\ninterval_ms = 250").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.drift.interval_ms, 250);
        // Defaults for missing fields
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.drift.light_step, 50);
        assert_eq!(config.board.name, "Arduino Uno R3");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_config_rejects_zero_interval() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("zero.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[drift]\ninterval_ms = 0").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.drift.temperature_step = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.client.url = "  ".to_string();
        assert!(config.validate().is_err());

        for step in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut config = Config::default();
            config.drift.temperature_step = step;
            assert!(config.validate().is_err(), "temperature_step {} accepted", step);
        }

        for step in [-1, 1024, i64::MAX] {
            let mut config = Config::default();
            config.drift.light_step = step;
            assert!(config.validate().is_err(), "light_step {} accepted", step);
        }

        let mut config = Config::default();
        config.drift.light_step = 1023;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_rejects_non_finite_temperature_step() {
        let dir = tempdir().unwrap();
        for value in ["nan", "inf", "-inf"] {
            let file_path = dir.path().join(format!("step_{}.toml", value));
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "[drift]\ntemperature_step = {}", value).unwrap();
            file.flush().unwrap();
            let result = load_config(file_path.to_str().unwrap());
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "{} accepted", value);
        }
    }
}
