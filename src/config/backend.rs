//! Forwarder backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the forwarder lives and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Forwarder base URL (REST and Socket.IO share it)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Socket.IO namespace carrying warnings
    #[serde(default = "default_warning_namespace")]
    pub warning_namespace: String,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.warning_namespace.starts_with('/') {
            return Err(ValidationError::InvalidNamespace(
                self.warning_namespace.clone(),
            ));
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            warning_namespace: default_warning_namespace(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_warning_namespace() -> String {
    "/warning".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.warning_namespace, "/warning");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let config = BackendConfig {
            base_url: "ftp://forwarder".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let config = BackendConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validation_relative_namespace() {
        let config = BackendConfig {
            warning_namespace: "warning".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidNamespace(_))
        ));
    }
}
