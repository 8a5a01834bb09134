//! Caller-supplied call options and their resolution
//!
//! Options arrive loosely typed (often straight from JSON), get checked
//! against documented defaults, and resolve into the concrete pieces the
//! gateway needs: a parsed url, validated breaker settings, and ready-made
//! request headers. Missing or mistyped fields are rejected here, before
//! anything reaches the breaker or the network.

use std::collections::HashMap;
use std::time::Duration;

use breakwater_core::BreakerSettings;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::error::OptionsError;

/// Default consecutive failures tolerated before the circuit opens
pub const DEFAULT_MAX_FAILURES: u32 = 2;

/// Default per-call deadline, in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 0.6;

/// Default cool-down before a probe is admitted, in seconds (retry in 1 hour)
pub const DEFAULT_COOL_DOWN_SECS: u64 = 3600;

fn default_max_failures() -> u32 {
    DEFAULT_MAX_FAILURES
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cool_down() -> u64 {
    DEFAULT_COOL_DOWN_SECS
}

/// Options for one gateway call
///
/// Only `url` is required; every other field falls back to the documented
/// default. Unknown fields are rejected rather than silently ignored, so a
/// typo in an option name fails loudly.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallOptions {
    /// Target url of the external content (required)
    pub url: String,

    /// Consecutive failures tolerated before the circuit opens
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Per-call deadline, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Cool-down before a probe is admitted, in seconds
    #[serde(default = "default_cool_down")]
    pub cool_down: u64,

    /// Extra request headers forwarded to the upstream
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl CallOptions {
    /// Create options for a url with all defaults applied
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_failures: DEFAULT_MAX_FAILURES,
            timeout: DEFAULT_TIMEOUT_SECS,
            cool_down: DEFAULT_COOL_DOWN_SECS,
            headers: HashMap::new(),
        }
    }

    /// Deserialize options from a JSON value
    ///
    /// Rejects missing `url`, mistyped fields, and unknown option names.
    pub fn from_value(value: serde_json::Value) -> Result<Self, OptionsError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Validate the options and resolve them into call-ready parts
    pub fn resolve(self) -> Result<ResolvedCall, OptionsError> {
        let url = Url::parse(&self.url)
            .map_err(|source| OptionsError::InvalidUrl { url: self.url.clone(), source })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OptionsError::UnsupportedScheme { scheme: url.scheme().to_string() });
        }

        if self.max_failures == 0 {
            return Err(OptionsError::NonPositive { field: "max_failures" });
        }

        // Rejects NaN, negative, and infinite values along with plain zero
        let call_timeout = Duration::try_from_secs_f64(self.timeout)
            .map_err(|_| OptionsError::InvalidDuration { field: "timeout" })?;
        if call_timeout.is_zero() {
            return Err(OptionsError::InvalidDuration { field: "timeout" });
        }

        if self.cool_down == 0 {
            return Err(OptionsError::NonPositive { field: "cool_down" });
        }
        let cool_down = Duration::from_secs(self.cool_down);

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|_| OptionsError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|_| OptionsError::InvalidHeader { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }

        let settings = BreakerSettings {
            max_failures: self.max_failures,
            call_timeout,
            cool_down,
        };

        Ok(ResolvedCall { url, settings, headers })
    }
}

/// Validated, call-ready form of [`CallOptions`]
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub url: Url,
    pub settings: BreakerSettings,
    pub headers: HeaderMap,
}
