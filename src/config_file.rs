//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{RateLimitConfig, RelayConfig, ServerConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Catalog settings
    pub catalog: Option<CatalogSettings>,
    /// Relay settings
    pub relay: Option<RelaySettings>,
    /// Rate limit settings
    pub rate_limit: Option<RateLimitSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Path to the catalog JSON file
    pub path: String,
    /// Directory holding the static browsing UI
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Maximum redirect hops
    pub max_redirects: Option<usize>,
    /// Upstream connect timeout in seconds
    pub connect_timeout_secs: Option<u64>,
    /// Idle-read timeout in seconds
    pub idle_read_timeout_secs: Option<u64>,
    /// User-Agent sent to upstream origins
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Requests allowed per window
    pub max_requests: Option<u32>,
    /// Window length in seconds
    pub window_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let relay_defaults = RelayConfig::default();
        let limit_defaults = RateLimitConfig::default();

        let relay = self.relay.map_or(relay_defaults.clone(), |r| RelayConfig {
            max_redirects: r.max_redirects.unwrap_or(relay_defaults.max_redirects),
            connect_timeout_secs: r
                .connect_timeout_secs
                .unwrap_or(relay_defaults.connect_timeout_secs),
            idle_read_timeout_secs: r
                .idle_read_timeout_secs
                .unwrap_or(relay_defaults.idle_read_timeout_secs),
            user_agent: r.user_agent.unwrap_or(relay_defaults.user_agent),
        });

        let rate_limit = self
            .rate_limit
            .map_or(limit_defaults.clone(), |r| RateLimitConfig {
                max_requests: r.max_requests.unwrap_or(limit_defaults.max_requests),
                window_secs: r.window_secs.unwrap_or(limit_defaults.window_secs),
            });

        let (catalog_path, static_dir) = match self.catalog {
            Some(c) => (
                c.path.into(),
                c.static_dir.map_or(defaults.static_dir.clone(), Into::into),
            ),
            None => (defaults.catalog_path.clone(), defaults.static_dir.clone()),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            catalog_path,
            static_dir,
            relay,
            rate_limit,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self.logging.map(|l| l.level).unwrap_or(defaults.log_level),
        }
    }
}
