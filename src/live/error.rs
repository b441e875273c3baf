use std::time::Duration;
use thiserror::Error;

/// Errors from live congestion lookups. Per-segment errors never abort a batch.
#[derive(Debug, Error)]
pub enum LiveSignalError {
    /// No API key in the environment; live sampling is switched off.
    #[error("Live congestion API key not configured (set {0})")]
    MissingApiKey(&'static str),

    /// No congestion service endpoint in the config; live sampling is switched off.
    #[error("Live congestion endpoint not configured (live_sampling.endpoint)")]
    MissingEndpoint,

    #[error("Invalid congestion endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Congestion query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Congestion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Congestion service returned HTTP {0}")]
    Status(u16),

    #[error("Failed to decode congestion response: {0}")]
    Decode(String),
}

impl LiveSignalError {
    /// True when the service rejected our credentials, so further queries are pointless
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, LiveSignalError::Status(401) | LiveSignalError::Status(403))
    }
}
