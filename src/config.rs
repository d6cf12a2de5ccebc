//! Server configuration

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Relay (video proxy) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Maximum redirect hops to chase before giving up
    pub max_redirects: usize,

    /// Timeout for establishing the upstream connection, in seconds
    pub connect_timeout_secs: u64,

    /// Idle-read timeout per hop: abort if no data arrives for this long
    pub idle_read_timeout_secs: u64,

    /// User-Agent sent upstream. Some origins reject requests without one.
    pub user_agent: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_redirects: 8,
            connect_timeout_secs: 10,
            idle_read_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) \
                         Gecko/20100101 Firefox/121.0"
                .to_string(),
        }
    }
}

/// Rate limiting configuration (fixed window per client IP)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Path to the catalog JSON file (flat list of episode records)
    pub catalog_path: PathBuf,

    /// Directory holding the static browsing UI
    pub static_dir: PathBuf,

    /// Relay configuration
    pub relay: RelayConfig,

    /// Rate limit configuration
    pub rate_limit: RateLimitConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            catalog_path: PathBuf::from("catalog.json"),
            static_dir: PathBuf::from("static"),
            relay: RelayConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Command line arguments. Anything given here overrides the config file.
#[derive(Parser, Debug, Clone)]
#[command(name = "media-catalog-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Host address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Path to the catalog JSON file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply CLI overrides on top of a loaded configuration.
    pub fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref catalog) = self.catalog {
            config.catalog_path = catalog.clone();
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.clone();
        }
    }
}
