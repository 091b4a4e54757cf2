//! Application configuration
//!
//! Layered with the `config` crate: an optional file, then `FALLWATCH_*`
//! environment variables (`__` separates nested keys, e.g.
//! `FALLWATCH_ESCALATION__CONFIRMATION_WINDOW_SECS=20`).

use alerting::EscalationConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use telemetry::TelemetryConfig;

use crate::error::ApiError;

/// Default config file stem, looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "fallwatch";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub escalation: EscalationConfig,
    pub telemetry: TelemetryConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (required when given) or the optional
    /// default file, overlaid with environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, ApiError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("FALLWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ApiError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot start with
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.server.addr.trim().is_empty() {
            return Err(ApiError::InvalidConfig("server.addr must not be empty".into()));
        }
        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| {
                ApiError::InvalidConfig(format!("unknown log level '{}'", self.logging.level))
            })?;
        self.escalation.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(source: &str) -> Result<AppConfig, ApiError> {
        AppConfig::build(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.escalation.confirmation_window_secs, 15);
        assert_eq!(config.telemetry.threshold_g, 3.0);
        assert!(config.telemetry.simulator.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config = from_toml(
            r#"
            [escalation]
            confirmation_window_secs = 20

            [telemetry]
            threshold_g = 2.5

            [telemetry.simulator]
            enabled = false
            fall_interval_secs = [5, 10]
            "#,
        )
        .unwrap();

        assert_eq!(config.escalation.confirmation_window_secs, 20);
        assert_eq!(config.escalation.help_display_secs, 3);
        assert_eq!(config.telemetry.threshold_g, 2.5);
        assert!(!config.telemetry.simulator.enabled);
        assert_eq!(config.telemetry.simulator.fall_interval_secs, (5, 10));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(from_toml("[logging]\nlevel = \"loud\"").is_err());
        assert!(from_toml("[escalation]\nconfirmation_window_secs = 0").is_err());
        assert!(from_toml("[telemetry]\nthreshold_g = -3.0").is_err());
    }
}
