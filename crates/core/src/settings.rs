//! Breaker settings and validation
//!
//! Settings are an immutable value object: how many consecutive failures to
//! tolerate, the per-call deadline, and how long an open circuit waits before
//! admitting a probe. Validation happens once, when the factory constructs a
//! breaker, so call sites never see configuration errors.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Configuration for circuit breaker behavior
///
/// Invariant: all three values are positive. `validate()` enforces this and
/// is called by [`CircuitBreakerFactory::create`](crate::CircuitBreakerFactory::create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Consecutive failures at which the circuit opens
    pub max_failures: u32,
    /// Deadline applied to each guarded call
    pub call_timeout: Duration,
    /// Time an open circuit waits before admitting a probe call
    pub cool_down: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            call_timeout: Duration::from_secs(30),
            cool_down: Duration::from_secs(60),
        }
    }
}

impl BreakerSettings {
    /// Create a new settings builder
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> BreakerSettingsBuilder {
        BreakerSettingsBuilder::new()
    }

    /// Create a settings builder (alias for `new()`)
    pub fn builder() -> BreakerSettingsBuilder {
        BreakerSettingsBuilder::new()
    }

    /// Validate the settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_failures == 0 {
            return Err(ConfigError::Invalid {
                message: "max_failures must be greater than 0".to_string(),
            });
        }

        if self.call_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "call_timeout must be a positive duration".to_string(),
            });
        }

        if self.cool_down.is_zero() {
            return Err(ConfigError::Invalid {
                message: "cool_down must be a positive duration".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for `BreakerSettings`
#[derive(Debug)]
pub struct BreakerSettingsBuilder {
    settings: BreakerSettings,
}

impl Default for BreakerSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerSettingsBuilder {
    pub fn new() -> Self {
        Self { settings: BreakerSettings::default() }
    }

    pub fn max_failures(mut self, max_failures: u32) -> Self {
        self.settings.max_failures = max_failures;
        self
    }

    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.settings.call_timeout = call_timeout;
        self
    }

    pub fn cool_down(mut self, cool_down: Duration) -> Self {
        self.settings.cool_down = cool_down;
        self
    }

    pub fn build(self) -> ConfigResult<BreakerSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
