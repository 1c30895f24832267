use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote directory service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the username-resolution API
    #[serde(default = "default_users_api")]
    pub users_api: String,
    /// Base URL of the friends-listing API
    #[serde(default = "default_friends_api")]
    pub friends_api: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry attempts for rate-limit / server errors
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search horizon: maximum number of edges in a discoverable chain
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Adjacency pagination page size (the directory caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Concurrent adjacency fetches per BFS level
    #[serde(default = "default_level_concurrency")]
    pub level_concurrency: usize,
}

/// Cache capacity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Username -> id and id -> display-name entries
    #[serde(default = "default_identity_capacity")]
    pub identity_capacity: usize,
    /// id -> full friends list entries
    #[serde(default = "default_adjacency_capacity")]
    pub adjacency_capacity: usize,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_users_api() -> String {
    "https://users.roblox.com".to_string()
}

fn default_friends_api() -> String {
    "https://friends.roblox.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_max_hops() -> usize {
    6
}

fn default_page_size() -> usize {
    100
}

fn default_level_concurrency() -> usize {
    8
}

fn default_identity_capacity() -> usize {
    65536
}

fn default_adjacency_capacity() -> usize {
    16384
}

fn default_port() -> u16 {
    8080
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            users_api: default_users_api(),
            friends_api: default_friends_api(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            page_size: default_page_size(),
            level_concurrency: default_level_concurrency(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            identity_capacity: default_identity_capacity(),
            adjacency_capacity: default_adjacency_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in SIXDEGREES_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// Every field has a default, so a missing ./config.toml falls back to
    /// the built-in defaults. A path set via SIXDEGREES_CONFIG must exist.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let explicit = std::env::var("SIXDEGREES_CONFIG").ok().map(PathBuf::from);
        let config_path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from("config.toml"));

        let config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            toml::from_str(&config_str).context("Failed to parse config.toml")?
        } else if explicit.is_some() {
            anyhow::bail!("Config file does not exist: {}", config_path.display());
        } else {
            log::info!("No config.toml found, using default configuration");
            Config::default()
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        Url::parse(&self.directory.users_api)
            .with_context(|| format!("directory.users_api is not a valid URL: {}", self.directory.users_api))?;
        Url::parse(&self.directory.friends_api)
            .with_context(|| format!("directory.friends_api is not a valid URL: {}", self.directory.friends_api))?;

        if self.search.max_hops == 0 {
            anyhow::bail!("search.max_hops must be greater than 0");
        }

        if self.search.page_size == 0 || self.search.page_size > 100 {
            anyhow::bail!("search.page_size must be between 1 and 100");
        }

        if self.search.level_concurrency == 0 {
            anyhow::bail!("search.level_concurrency must be greater than 0");
        }

        if self.cache.identity_capacity == 0 || self.cache.adjacency_capacity == 0 {
            anyhow::bail!("cache capacities must be greater than 0");
        }

        Ok(())
    }
}
