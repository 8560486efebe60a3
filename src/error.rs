// src/error.rs

//! Unified error handling for the harvester.
//!
//! Two layers live here:
//! - [`FetchError`]: the closed set of failure kinds produced at the
//!   transport boundary. Retry predicates match on these.
//! - [`AppError`]: everything else, including a fetch that exhausted its
//!   retry budget.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A fetch gave up after its retry budget was spent.
    #[error("Fetch failed for {context} after {attempts} attempt(s): {source}")]
    Fetch {
        context: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// One or more projects ended the run in the failed state.
    #[error("Run failed for project(s): {}", failed.join(", "))]
    RunFailed { failed: Vec<String> },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an exhausted-retries error with context.
    pub fn fetch(context: impl fmt::Display, attempts: u32, source: FetchError) -> Self {
        Self::Fetch {
            context: context.to_string(),
            attempts,
            source,
        }
    }
}

/// Tag for a [`FetchError`], used by retry predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    RateLimited,
    ServerError,
    ClientError,
    Decode,
}

/// Failure of a single upstream request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout or connection-level failure
    #[error("transient network error: {0}")]
    Transient(String),

    /// HTTP 429, optionally with the server's Retry-After hint
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-2xx status
    #[error("request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    /// 2xx response whose body is not the expected JSON
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The request could not be built (e.g. a malformed issue key)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) => FailureKind::Transient,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::RequestFailed { status, .. } if *status >= 500 => FailureKind::ServerError,
            Self::RequestFailed { .. } | Self::InvalidRequest(_) => FailureKind::ClientError,
            Self::Decode(_) => FailureKind::Decode,
        }
    }

    /// Server-suggested delay, if this is a throttle response that carried one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::RequestFailed {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        Self::Transient(err.to_string())
    }
}
