//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OEMBED_*)
//! 2. TOML config file (if OEMBED_CONFIG_FILE set, or passed explicitly)
//! 3. Built-in defaults
//!
//! The library itself never loads configuration; embedding applications build
//! a [`RegistryConfig`] and [`GatewayOptions`] however they like. [`AppConfig`]
//! is the ready-made way to get both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod registry;
mod validation;

pub use registry::{EndpointConfig, GatewayOptions, Params, RegistryConfig};
pub use validation::ConfigError;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_FILE_ENV: &str = "OEMBED_CONFIG_FILE";

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "OEMBED_";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OEMBED_*)
/// 2. TOML config file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP requests.
    ///
    /// Set via OEMBED_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connection phase timeout in seconds. Unset leaves only the total timeout.
    ///
    /// Set via OEMBED_CONNECT_TIMEOUT_SECS environment variable.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Total request timeout in seconds.
    ///
    /// Set via OEMBED_TIMEOUT_SECS environment variable.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether TLS certificates are verified.
    ///
    /// Set via OEMBED_VERIFY_TLS_PEER environment variable.
    #[serde(default = "default_true")]
    pub verify_tls_peer: bool,

    /// Maximum number of redirects to follow; 0 disables redirects.
    ///
    /// Set via OEMBED_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Whether `<link>` discovery runs when no endpoint matches.
    ///
    /// Set via OEMBED_DISCOVERY environment variable.
    #[serde(default)]
    pub discovery: bool,

    /// Allow-list of resource URL patterns; empty allows all.
    ///
    /// Set via OEMBED_ALLOWED_URL_PATTERNS environment variable (`[a, b]`).
    #[serde(default)]
    pub allowed_url_patterns: Vec<String>,

    /// Ordered endpoint registry. Usually set in the TOML file as `[[endpoints]]`.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

fn default_user_agent() -> String {
    "oembed-rs/0.1".into()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: None,
            timeout_secs: default_timeout_secs(),
            verify_tls_peer: true,
            max_redirects: default_max_redirects(),
            discovery: false,
            allowed_url_patterns: Vec::new(),
            endpoints: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Total timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as Duration, if configured.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OEMBED_`
    /// 2. TOML file from `OEMBED_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Same as [`AppConfig::load`] with an explicit TOML file instead of `OEMBED_CONFIG_FILE`.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Transport options for the HTTP gateway.
    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            user_agent: Some(self.user_agent.clone()),
            connect_timeout: self.connect_timeout(),
            timeout: Some(self.timeout()),
            verify_tls_peer: Some(self.verify_tls_peer),
            max_redirects: Some(self.max_redirects),
        }
    }

    /// Registry configuration: endpoints, discovery flag and allow-list.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            endpoints: self.endpoints.clone(),
            discovery: self.discovery,
            allowed_url_patterns: self.allowed_url_patterns.clone(),
        }
    }
}
