//! Factory owning the identity-keyed breaker state
//!
//! The factory is the explicit owner of the mapping from endpoint identity
//! to breaker state. It is constructed once at startup, held by the host's
//! application context, and injected wherever breakers are needed; there is
//! no ambient global registry. State is created lazily per identity and
//! lives for the process lifetime.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::breaker::CircuitBreaker;
use crate::clock::{Clock, SystemClock};
use crate::error::ConfigResult;
use crate::settings::BreakerSettings;
use crate::state::{BreakerSnapshot, BreakerState, CircuitState};

/// Opaque key identifying which breaker governs an external dependency
///
/// Typically a target URL or a logical service name. Calls with the same
/// identity share one circuit; different identities are fully independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(String);

impl EndpointId {
    /// Create an endpoint identity from any string-like key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// View the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EndpointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Shared map from endpoint identity to its breaker state
///
/// Sharded locking: obtaining one endpoint's state never contends with
/// traffic to other endpoints.
#[derive(Debug, Clone, Default)]
pub(crate) struct BreakerRegistry {
    states: Arc<DashMap<EndpointId, BreakerState>>,
}

impl BreakerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get the breaker state for an endpoint, creating it lazily
    pub(crate) fn obtain(&self, target: &EndpointId) -> BreakerState {
        if let Some(state) = self.states.get(target) {
            return state.clone();
        }
        self.states.entry(target.clone()).or_default().value().clone()
    }

    /// Get the breaker state for an endpoint without creating it
    pub(crate) fn peek(&self, target: &EndpointId) -> Option<BreakerState> {
        self.states.get(target).map(|state| state.clone())
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }
}

/// Constructs circuit breakers over a shared endpoint registry
///
/// `create()` validates settings and returns a [`CircuitBreaker`] handle;
/// invalid settings fail fast here rather than surfacing at call time.
/// Every handle created by the same factory shares the same per-endpoint
/// state, so repeated calls to the same endpoint observe one circuit
/// regardless of which handle made them.
pub struct CircuitBreakerFactory<C: Clock = SystemClock> {
    registry: BreakerRegistry,
    clock: Arc<C>,
}

impl CircuitBreakerFactory<SystemClock> {
    /// Create a factory using the real system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for CircuitBreakerFactory<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CircuitBreakerFactory<C> {
    /// Create a factory with a custom clock (useful for testing)
    pub fn with_clock(clock: C) -> Self {
        Self { registry: BreakerRegistry::new(), clock: Arc::new(clock) }
    }

    /// Create a circuit breaker bound to these settings
    ///
    /// Settings are validated here; a zero threshold or zero duration is a
    /// [`ConfigError`](crate::ConfigError), never a call-time surprise.
    pub fn create(&self, settings: BreakerSettings) -> ConfigResult<CircuitBreaker<C>> {
        settings.validate()?;
        Ok(CircuitBreaker::new(settings, self.registry.clone(), Arc::clone(&self.clock)))
    }

    /// Number of endpoint identities with tracked breaker state
    pub fn endpoint_count(&self) -> usize {
        self.registry.len()
    }

    /// Circuit state for an endpoint, if any call has been gated for it
    pub fn state_of(&self, target: &EndpointId) -> Option<CircuitState> {
        self.registry.peek(target).map(|state| state.state())
    }

    /// Snapshot for an endpoint, if any call has been gated for it
    pub fn snapshot_of(&self, target: &EndpointId) -> Option<BreakerSnapshot> {
        self.registry.peek(target).map(|state| state.snapshot())
    }
}

impl<C: Clock> Clone for CircuitBreakerFactory<C> {
    fn clone(&self) -> Self {
        Self { registry: self.registry.clone(), clock: Arc::clone(&self.clock) }
    }
}

impl<C: Clock> fmt::Debug for CircuitBreakerFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerFactory").field("endpoints", &self.registry.len()).finish()
    }
}
