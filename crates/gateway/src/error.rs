//! Error types for option resolution, the HTTP client, and the gateway
//!
//! The gateway keeps the breaker's propagation policy: upstream failures and
//! timeouts surface with their cause intact, while a denial becomes a
//! service-unavailable condition carrying the cool-down as a retry-after
//! hint.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from resolving caller-supplied call options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The options payload did not deserialize (missing `url`, unknown
    /// fields, wrong types)
    #[error("Invalid options payload: {source}")]
    Malformed {
        #[from]
        source: serde_json::Error,
    },

    /// The target url failed to parse
    #[error("Invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The target url uses a scheme the gateway does not speak
    #[error("Unsupported url scheme '{scheme}': only http and https are allowed")]
    UnsupportedScheme { scheme: String },

    /// A numeric option that must be positive was zero
    #[error("{field} must be greater than 0")]
    NonPositive { field: &'static str },

    /// A duration option was not a finite positive number of seconds
    #[error("{field} must be a finite positive number of seconds")]
    InvalidDuration { field: &'static str },

    /// A header entry could not be converted into a valid HTTP header
    #[error("Invalid header name or value for '{name}'")]
    InvalidHeader { name: String },
}

/// Errors from one upstream fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, or body-read failure
    #[error("HTTP transport error")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status
    #[error("Unexpected HTTP status {status}")]
    Status { status: StatusCode },
}

/// Errors surfaced by the gateway to its caller
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller-supplied options were rejected before any call was made
    #[error("Invalid call options")]
    InvalidOptions {
        #[from]
        source: OptionsError,
    },

    /// Breaker settings derived from the options failed validation
    #[error("Invalid breaker configuration")]
    Config {
        #[from]
        source: breakwater_core::ConfigError,
    },

    /// The circuit is open; the upstream was not contacted
    ///
    /// `retry_after` is the breaker's cool-down, telling the caller when a
    /// probe becomes possible.
    #[error("External service unavailable, retry after {retry_after:?}")]
    ServiceUnavailable { retry_after: Duration },

    /// The upstream did not answer within the per-call deadline
    #[error("External call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The upstream call itself failed
    #[error("External call failed")]
    Upstream {
        #[source]
        source: FetchError,
    },
}

impl GatewayError {
    /// The retry-after hint, when this error carries one
    ///
    /// Present only for the service-unavailable condition, mirroring an
    /// HTTP 503 `Retry-After` header.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::ServiceUnavailable { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
