//! Error types for circuit breaker construction and guarded calls
//!
//! Two layers: [`ConfigError`] is raised once, at factory `create()` time,
//! when settings fail validation. [`BreakerError`] is the per-call error,
//! generic over the operation's own error type `E` so the original cause is
//! preserved and reachable through `source()`.

use std::time::Duration;

use thiserror::Error;

/// Settings validation error, raised at construction time
///
/// Invalid settings never surface at call time: `create()` rejects them
/// before a breaker handle exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors produced by a guarded call
///
/// Generic over the underlying operation error type `E`, allowing the breaker
/// to wrap and preserve the original error while adding its own variants for
/// denial and timeout.
#[derive(Debug, Error)]
pub enum BreakerError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The circuit denied the call before the operation ran
    ///
    /// Produced by the conventional rejecting fallback; a custom fallback may
    /// substitute any outcome instead.
    #[error("Circuit breaker denied the call")]
    Rejected,

    /// The operation did not complete within the per-call deadline
    ///
    /// Counted like any other failure, but kept as its own variant so logs
    /// and callers can tell a slow dependency from a broken one.
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The underlying operation failed
    #[error("Operation failed")]
    Operation {
        #[source]
        source: E,
    },
}

impl<E> BreakerError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Whether this error is the breaker's own denial signal
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Whether this error came from the per-call deadline
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for guarded calls
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;
