//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `Default` implementations and `#[serde(default)]`
//! 2. **Config file**: TOML file named by the `WATCHER_CONFIG` env var
//! 3. **Environment variables**: `WATCHER__SECTION__FIELD` overrides
//!
//! # Configuration Sections
//!
//! - [`ServerConfig`]: HTTP API bind address and request timeout
//! - [`RegistryConfig`]: chain registry location, upgrade feed and HTTP timeouts
//! - [`CacheConfig`]: TTL and sweep interval
//! - [`FanOutConfig`]: concurrency caps and the read deadline
//! - [`JobsConfig`]: periodic jobs
//! - [`NotificationConfig`]: Slack webhook and startup notification delay
//! - [`LoggingConfig`]: log level and format
//!
//! The monitored chain list lives in a separate file, see [`chains`].
//!
//! # Example
//!
//! ```toml
//! chains_file = "config/chains.yaml"
//!
//! [server]
//! bind_port = 8080
//!
//! [cache]
//! ttl_seconds = 300
//!
//! [[jobs.predefined]]
//! name = "poller"
//! task = "refresh-registry"
//! interval_seconds = 60
//! ```

pub mod chains;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, time::Duration};

use crate::jobs::JobKind;

pub use chains::{ChainEntry, ChainsConfig};

/// HTTP server configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port number to listen on. Defaults to `8080`.
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Per-request timeout for the API in seconds. Defaults to `35`.
    ///
    /// Must exceed `fanout.read_deadline_seconds` so aggregate reads report
    /// their own deadline first.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8080
}

fn default_request_timeout_seconds() -> u64 {
    35
}

/// Where chain descriptors and upgrade data come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry root. Defaults to the public chain registry on GitHub.
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,

    /// Subdirectory holding mainnet chains. Empty means the registry root.
    #[serde(default)]
    pub mainnet_partition: String,

    /// Subdirectory holding testnet chains. Defaults to `testnets`.
    #[serde(default = "default_testnet_partition")]
    pub testnet_partition: String,

    /// Secondary upgrade feed. `None` disables it.
    #[serde(default = "default_upgrade_feed_url")]
    pub upgrade_feed_url: Option<String>,

    /// Timeout for existence probes in milliseconds. Defaults to `3000`.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for document fetches in seconds. Defaults to `5`.
    #[serde(default = "default_registry_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Maximum concurrent outbound requests. Defaults to `32`.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_registry_base_url() -> String {
    "https://raw.githubusercontent.com/cosmos/chain-registry/master".to_string()
}

fn default_testnet_partition() -> String {
    "testnets".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_upgrade_feed_url() -> Option<String> {
    Some("https://polkachu.com/api/v2/chain_upgrades".to_string())
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_registry_request_timeout_seconds() -> u64 {
    5
}

fn default_max_concurrent_requests() -> usize {
    32
}

fn default_user_agent() -> String {
    concat!("upgrade-watcher/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Cache lifetime settings. Negative entries share the positive TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds. Must be greater than 0. Defaults to `300`.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// How often expired entries are evicted, in seconds. Defaults to `10`.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_sweep_interval_seconds() -> u64 {
    10
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

/// Concurrency caps for multi-chain operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutConfig {
    /// Cap for background refreshes. Defaults to `5`.
    #[serde(default = "default_background_concurrency")]
    pub background_concurrency: usize,

    /// Cap for interactive aggregate reads. Defaults to `10`.
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,

    /// Deadline for interactive aggregate reads in seconds. Defaults to `30`.
    #[serde(default = "default_read_deadline_seconds")]
    pub read_deadline_seconds: u64,
}

fn default_background_concurrency() -> usize {
    5
}

fn default_read_concurrency() -> usize {
    10
}

fn default_read_deadline_seconds() -> u64 {
    30
}

/// A named periodic job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobDefinition {
    pub name: String,

    /// What the job runs.
    pub task: JobKind,

    /// Seconds between runs. The first run happens when the scheduler starts.
    pub interval_seconds: u64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub description: String,
}

impl JobDefinition {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Maximum number of jobs running at once across the scheduler. Defaults to `3`.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent: usize,

    #[serde(default = "default_predefined_jobs")]
    pub predefined: Vec<JobDefinition>,
}

fn default_max_concurrent_jobs() -> usize {
    3
}

fn default_predefined_jobs() -> Vec<JobDefinition> {
    vec![
        JobDefinition {
            name: "load-chains".to_string(),
            task: JobKind::LoadChains,
            interval_seconds: 3600,
            enabled: true,
            description: "Reload the monitored chain list and prime the cache".to_string(),
        },
        JobDefinition {
            name: "registry-poller".to_string(),
            task: JobKind::RefreshRegistry,
            interval_seconds: 60,
            enabled: true,
            description: "Refresh descriptors and upgrades for monitored chains".to_string(),
        },
        JobDefinition {
            name: "upgrade-checker".to_string(),
            task: JobKind::CheckUpgrades,
            interval_seconds: 3600,
            enabled: true,
            description: "Notify about newly scheduled upgrades".to_string(),
        },
    ]
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Slack incoming webhook. Falls back to `SLACK_WEBHOOK_URL` when unset.
    #[serde(default)]
    pub slack_webhook_url: Option<String>,

    /// Whether to check every monitored chain shortly after startup. Defaults to `true`.
    #[serde(default = "default_enabled")]
    pub notify_on_startup: bool,

    /// Delay before the startup check in seconds. Defaults to `5`.
    #[serde(default = "default_startup_delay_seconds")]
    pub startup_delay_seconds: u64,
}

fn default_startup_delay_seconds() -> u64 {
    5
}

impl NotificationConfig {
    /// Returns the configured webhook, or the `SLACK_WEBHOOK_URL` env var.
    #[must_use]
    pub fn slack_webhook(&self) -> Option<String> {
        self.slack_webhook_url
            .clone()
            .or_else(|| std::env::var("SLACK_WEBHOOK_URL").ok())
            .filter(|url| !url.trim().is_empty())
    }

    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_seconds)
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Root application configuration.
///
/// Loaded from TOML and `WATCHER__`-prefixed environment variables using `__` as the
/// nesting separator, e.g. `WATCHER__CACHE__TTL_SECONDS=600`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment (e.g., "development", "production"). Defaults to `"development"`.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub fanout: FanOutConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Path of the monitored chain list. Defaults to `config/chains.yaml`.
    #[serde(default = "default_chains_file")]
    pub chains_file: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_chains_file() -> String {
    "config/chains.yaml".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_base_url(),
            mainnet_partition: String::new(),
            testnet_partition: default_testnet_partition(),
            upgrade_feed_url: default_upgrade_feed_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_seconds: default_registry_request_timeout_seconds(),
            max_concurrent_requests: default_max_concurrent_requests(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            background_concurrency: default_background_concurrency(),
            read_concurrency: default_read_concurrency(),
            read_deadline_seconds: default_read_deadline_seconds(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { max_concurrent: default_max_concurrent_jobs(), predefined: default_predefined_jobs() }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            notify_on_startup: true,
            startup_delay_seconds: default_startup_delay_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
            cache: CacheConfig::default(),
            fanout: FanOutConfig::default(),
            jobs: JobsConfig::default(),
            notifications: NotificationConfig::default(),
            chains_file: default_chains_file(),
            logging: LoggingConfig::default(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// A missing file is not an error; defaults and environment variables still apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("environment", "development")?
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 8080)?
            .set_default("cache.ttl_seconds", 300)?
            .set_default("cache.sweep_interval_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("WATCHER").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml`, or the path in `WATCHER_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("WATCHER_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
            .parse()
            .map_err(|_| {
                format!(
                    "Invalid socket address: {}:{}",
                    self.server.bind_address, self.server.bind_port
                )
            })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_port == 0 {
            return Err("Bind port must be greater than 0".to_string());
        }

        if self.server.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        if !is_http_url(&self.registry.base_url) {
            return Err(format!("Invalid registry URL: {}", self.registry.base_url));
        }

        if let Some(ref feed) = self.registry.upgrade_feed_url {
            if !is_http_url(feed) {
                return Err(format!("Invalid upgrade feed URL: {feed}"));
            }
        }

        if self.registry.probe_timeout_ms == 0 || self.registry.request_timeout_seconds == 0 {
            return Err("Registry timeouts must be greater than 0".to_string());
        }

        if self.registry.max_concurrent_requests == 0 {
            return Err("Max concurrent registry requests must be greater than 0".to_string());
        }

        if self.cache.ttl_seconds == 0 {
            return Err("Cache TTL must be greater than 0".to_string());
        }

        if self.cache.sweep_interval_seconds == 0 {
            return Err("Cache sweep interval must be greater than 0".to_string());
        }

        if self.fanout.background_concurrency == 0 || self.fanout.read_concurrency == 0 {
            return Err("Fan-out concurrency must be greater than 0".to_string());
        }

        if self.fanout.read_deadline_seconds == 0 {
            return Err("Read deadline must be greater than 0".to_string());
        }

        if self.server.request_timeout_seconds <= self.fanout.read_deadline_seconds {
            return Err(format!(
                "Request timeout ({}s) must be greater than the read deadline ({}s)",
                self.server.request_timeout_seconds, self.fanout.read_deadline_seconds
            ));
        }

        if self.jobs.max_concurrent == 0 {
            return Err("Max concurrent jobs must be greater than 0".to_string());
        }

        let mut names = HashSet::new();
        for job in &self.jobs.predefined {
            if job.name.trim().is_empty() {
                return Err("Job name cannot be empty".to_string());
            }
            if !names.insert(job.name.as_str()) {
                return Err(format!("Duplicate job name: {}", job.name));
            }
            if job.interval_seconds == 0 {
                return Err(format!("Interval for job {} must be greater than 0", job.name));
            }
        }

        if let Some(ref webhook) = self.notifications.slack_webhook_url {
            if !is_http_url(webhook) {
                return Err("Invalid Slack webhook URL".to_string());
            }
        }

        if self.chains_file.trim().is_empty() {
            return Err("Chains file path cannot be empty".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
