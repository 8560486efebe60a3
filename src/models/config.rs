//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Pagination and output settings
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Backoff settings for a single page fetch
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.client.user_agent.trim().is_empty() {
            return Err(AppError::validation("client.user_agent is empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::validation("client.timeout_secs must be > 0"));
        }
        if self.client.max_concurrent == 0 {
            return Err(AppError::validation("client.max_concurrent must be > 0"));
        }
        self.client.base_url()?;
        if self.scrape.page_size == 0 {
            return Err(AppError::validation("scrape.page_size must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(AppError::validation(
                "retry.max_delay_ms must be >= retry.base_delay_ms",
            ));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root of the Jira instance; REST and browse paths are joined onto it
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum requests in flight across all projects
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Bearer token, if the instance requires authentication
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl ClientConfig {
    /// Parsed base URL, always ending in `/` so relative joins append.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(AppError::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            auth_token: None,
        }
    }
}

/// Pagination and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Issues requested per page (`maxResults`)
    #[serde(default = "defaults::page_size")]
    pub page_size: u64,

    /// Directory holding `<PROJECT>.jsonl` files
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Checkpoint file path
    #[serde(default = "defaults::checkpoint_file")]
    pub checkpoint_file: PathBuf,

    /// `expand` directive sent with every request
    #[serde(default = "defaults::expand")]
    pub expand: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            output_dir: defaults::output_dir(),
            checkpoint_file: defaults::checkpoint_file(),
            expand: defaults::expand(),
        }
    }
}

/// Backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per fetch, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the computed delay
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,

    /// Also retry non-429 4xx responses
    #[serde(default)]
    pub retry_client_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_ms: defaults::base_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
            retry_client_errors: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Client defaults
    pub fn base_url() -> String {
        "https://issues.apache.org/jira/".into()
    }
    pub fn user_agent() -> String {
        concat!("issue-harvest/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Scrape defaults
    pub fn page_size() -> u64 {
        50
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from("output")
    }
    pub fn checkpoint_file() -> PathBuf {
        PathBuf::from("checkpoint.json")
    }
    pub fn expand() -> String {
        "renderedFields,comments".into()
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        8
    }
    pub fn base_delay_ms() -> u64 {
        1_000
    }
    pub fn max_delay_ms() -> u64 {
        60_000
    }
}
