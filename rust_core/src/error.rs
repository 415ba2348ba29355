//! Error types shared across the price monitor core.

use thiserror::Error;

/// Failure of a single batch fetch against a price provider.
///
/// A fetch is all-or-nothing: when any of these is returned, no partial
/// prices are handed back to the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("bad response status: {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("fetch cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Errors raised while loading the product catalogue.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid product in store '{store}': {reason}")]
    InvalidProduct { store: String, reason: String },
}

/// A provider kind string that names no known source implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown provider kind: '{0}'")]
pub struct UnknownProviderKind(pub String);
