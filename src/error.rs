//! Error kinds a page fetch can end with.
//!
//! Every variant is recoverable from the pager's point of view: the
//! controller records the failure, offers a retry and keeps what it has.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connection refused, DNS, reset).
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),

    #[error("could not decode page: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("context not found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// True for failures that may go away by themselves once connectivity
    /// returns, as opposed to a missing context.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout) || matches!(self, Self::Status(code) if *code >= 500)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Io(format!("{:#}", err))
    }
}
