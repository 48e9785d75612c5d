use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{MediaBrowserError, Result};
use crate::logging::parse_log_level;

/// Which server flavour the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    #[default]
    Jellyfin,
    Emby,
}

impl ServerType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jellyfin => "Jellyfin",
            Self::Emby => "Emby",
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `http://localhost:8096`
    pub server_url: String,
    pub server_type: ServerType,
    /// Client name and version sent in the authorization header
    pub client_name: String,
    pub client_version: String,
    pub device_name: String,
    pub device_id: String,
    /// How long the user snapshot (and library list) stays fresh
    pub cache_ttl_minutes: u64,
    pub request_timeout_seconds: u64,
    /// Attach error response bodies to returned errors
    pub verbose: bool,
    /// Advertise gzip and decode compressed responses
    pub gzip: bool,
    /// Log transport failures instead of exiting the process
    pub no_fail: bool,
    /// Route every request through this HTTP proxy, e.g. `http://10.0.0.1:3128`
    pub proxy: Option<String>,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8096".to_string(),
            server_type: ServerType::default(),
            client_name: "mediabrowser".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            device_name: "mediabrowser".to_string(),
            device_id: "mediabrowser".to_string(),
            cache_ttl_minutes: 30,
            request_timeout_seconds: 10,
            verbose: false,
            gzip: true,
            no_fail: true,
            proxy: None,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Subscriber settings used by [`MediaBrowser::from_config`](crate::MediaBrowser::from_config).
///
/// Nothing is installed unless `install` is set; embedding applications
/// usually bring their own subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub install: bool,
    pub level: String,
    pub format: LogFormat,
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            install: false,
            level: "info".to_string(),
            format: LogFormat::default(),
            file_path: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `server_url` with default settings.
    #[must_use]
    pub fn new(server_url: impl Into<String>, server_type: ServerType) -> Self {
        Self {
            server_url: server_url.into(),
            server_type,
            ..Self::default()
        }
    }

    /// Load configuration from an optional file, then `MEDIABROWSER_*` environment variables.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // MEDIABROWSER_SERVER_URL, MEDIABROWSER_LOGGING__LEVEL, etc.
        builder = builder.add_source(
            Environment::with_prefix("MEDIABROWSER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check the settings the client can't work without.
    pub fn validate(&self) -> Result<()> {
        let url = self.server_url.trim();
        if url.is_empty() {
            return Err(MediaBrowserError::InvalidConfig(
                "server_url cannot be empty".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(MediaBrowserError::InvalidConfig(
                "server_url must start with http:// or https://".to_string(),
            ));
        }
        if self.client_name.is_empty() || self.client_version.is_empty() {
            return Err(MediaBrowserError::InvalidConfig(
                "client name and version are required".to_string(),
            ));
        }
        if self.device_name.is_empty() || self.device_id.is_empty() {
            return Err(MediaBrowserError::InvalidConfig(
                "device name and device id are required".to_string(),
            ));
        }
        parse_log_level(&self.logging.level)
            .map_err(|e| MediaBrowserError::InvalidConfig(e.to_string()))?;
        Ok(())
    }

    /// Server URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> String {
        self.server_url.trim().trim_end_matches('/').to_string()
    }

    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
