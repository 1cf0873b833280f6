//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.
//! Regular expressions are compiled (and rejected) by the registry itself.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Upper bound for both timeouts, in seconds.
const MAX_TIMEOUT_SECS: u64 = 300;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `user_agent` is empty
    /// - `timeout_secs` is 0 or exceeds 5 minutes
    /// - `connect_timeout_secs` is 0 or longer than `timeout_secs`
    /// - an endpoint has an empty `pattern` or `url`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid { field: "timeout_secs".into(), reason: "must be greater than 0".into() });
        }
        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                field: "timeout_secs".into(),
                reason: "must not exceed 5 minutes (300s)".into(),
            });
        }

        if let Some(connect) = self.connect_timeout_secs {
            if connect == 0 {
                return Err(ConfigError::Invalid {
                    field: "connect_timeout_secs".into(),
                    reason: "must be greater than 0".into(),
                });
            }
            if connect > self.timeout_secs {
                return Err(ConfigError::Invalid {
                    field: "connect_timeout_secs".into(),
                    reason: "must not exceed timeout_secs".into(),
                });
            }
        }

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.pattern.is_empty() {
                return Err(ConfigError::Invalid {
                    field: format!("endpoints[{index}].pattern"),
                    reason: "must not be empty".into(),
                });
            }
            if endpoint.url.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: format!("endpoints[{index}].url"),
                    reason: "must not be empty".into(),
                });
            }
        }

        if self.endpoints.is_empty() && !self.discovery {
            tracing::warn!("No endpoints configured and discovery is disabled; every lookup will fail");
        }

        if !self.verify_tls_peer {
            tracing::warn!("TLS peer verification is disabled");
        }

        Ok(())
    }
}
