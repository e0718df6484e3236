//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PINIC_CONSOLE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use pinic_console::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Forwarder at {}", config.backend.base_url);
//! ```

mod backend;
mod console;
mod error;
mod logging;

pub use backend::BackendConfig;
pub use console::ConsoleConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a console
/// pointed at a forwarder on localhost.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Forwarder location and transport settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Refresh cadence and buffer sizes
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PINIC_CONSOLE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PINIC_CONSOLE__BACKEND__BASE_URL=http://10.0.0.2:8080` -> `backend.base_url`
    /// - `PINIC_CONSOLE__CONSOLE__CHART_CAPACITY=100` -> `console.chart_capacity`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PINIC_CONSOLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.backend.validate()?;
        self.console.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "PINIC_CONSOLE__BACKEND__BASE_URL",
        "PINIC_CONSOLE__BACKEND__REQUEST_TIMEOUT_SECS",
        "PINIC_CONSOLE__CONSOLE__CHART_CAPACITY",
        "PINIC_CONSOLE__CONSOLE__TREE_REFRESH_SECS",
        "PINIC_CONSOLE__LOGGING__JSON",
        "PINIC_CONSOLE__CONSOLE__WARNING_LOG_LEN",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.console.chart_capacity, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PINIC_CONSOLE__BACKEND__BASE_URL", "http://10.0.0.2:9000");
        env::set_var("PINIC_CONSOLE__BACKEND__REQUEST_TIMEOUT_SECS", "3");
        env::set_var("PINIC_CONSOLE__CONSOLE__CHART_CAPACITY", "100");
        env::set_var("PINIC_CONSOLE__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.backend.request_timeout_secs, 3);
        assert_eq!(config.console.chart_capacity, 100);
        assert_eq!(config.console.warning_log_len, 6);
        assert!(config.logging.json);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PINIC_CONSOLE__CONSOLE__WARNING_LOG_LEN", "0");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange {
                field: "warning_log_len",
                ..
            })
        ));
    }

    #[test]
    fn test_unparseable_value_is_load_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PINIC_CONSOLE__CONSOLE__TREE_REFRESH_SECS", "soon");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
