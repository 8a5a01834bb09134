//! Circuit breaker facade combining gating, execution, and outcome recording
//!
//! [`CircuitBreaker`] is the unit a caller interacts with: `call()` asks the
//! endpoint's state machine for admission, runs the operation under the
//! configured deadline when admitted, feeds the outcome back, and routes a
//! denial through the caller-supplied fallback instead of the operation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{BreakerError, BreakerResult};
use crate::executor::{CallExecutor, CallOutcome};
use crate::factory::{BreakerRegistry, EndpointId};
use crate::settings::BreakerSettings;
use crate::state::{Admission, BreakerSnapshot, BreakerState, CircuitState, ProbeGuard};

/// Circuit breaker handle bound to one settings profile
///
/// Handles are created by [`CircuitBreakerFactory::create`] and share the
/// factory's per-endpoint state: two handles calling the same endpoint see
/// the same circuit, and repeated `create()` calls never reset a tripped
/// breaker.
///
/// [`CircuitBreakerFactory::create`]: crate::CircuitBreakerFactory::create
pub struct CircuitBreaker<C: Clock = SystemClock> {
    settings: BreakerSettings,
    registry: BreakerRegistry,
    executor: CallExecutor,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("settings", &self.settings)
            .field("endpoints", &self.registry.len())
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            registry: self.registry.clone(),
            executor: self.executor,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> CircuitBreaker<C> {
    pub(crate) fn new(settings: BreakerSettings, registry: BreakerRegistry, clock: Arc<C>) -> Self {
        Self { settings, registry, executor: CallExecutor::new(), clock }
    }

    /// Execute an operation with circuit breaker protection
    ///
    /// 1. Ask the endpoint's state machine for admission.
    /// 2. On denial, invoke `fallback` and return its result; the operation
    ///    never runs.
    /// 3. Otherwise run the operation under the configured call timeout.
    /// 4. Feed the outcome back: a success resets the failure count (and
    ///    closes the circuit when it was the probe); a failure or timeout
    ///    counts toward the threshold (and reopens the circuit when it was
    ///    the probe).
    ///
    /// Operation errors are not swallowed: they propagate to the caller as
    /// [`BreakerError::Operation`] with the original error as its source.
    /// Only the gating decision is replaced by the fallback.
    #[instrument(skip(self, operation, fallback), fields(target = %target))]
    pub async fn call<F, Fut, T, E, FB>(
        &self,
        target: &EndpointId,
        operation: F,
        fallback: FB,
    ) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        FB: FnOnce() -> BreakerResult<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let state = self.registry.obtain(target);

        match state.admit(&self.settings, self.clock.now()) {
            Admission::Deny => {
                debug!("Circuit breaker rejecting call - state: {}", state.state());
                fallback()
            }
            Admission::Allow => {
                let outcome = self.executor.execute(operation, self.settings.call_timeout).await;
                self.record_outcome(&state, outcome, None)
            }
            Admission::AllowAsProbe(guard) => {
                debug!("Circuit breaker admitting probe call");
                let outcome = self.executor.execute(operation, self.settings.call_timeout).await;
                self.record_outcome(&state, outcome, Some(guard))
            }
        }
    }

    /// Execute an operation with the conventional rejecting fallback
    ///
    /// Denials surface as [`BreakerError::Rejected`] instead of a substitute
    /// value. Equivalent to `call(target, operation, || Err(BreakerError::Rejected))`.
    pub async fn try_call<F, Fut, T, E>(
        &self,
        target: &EndpointId,
        operation: F,
    ) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.call(target, operation, || Err(BreakerError::Rejected)).await
    }

    fn record_outcome<T, E>(
        &self,
        state: &BreakerState,
        outcome: CallOutcome<T, E>,
        probe: Option<ProbeGuard>,
    ) -> BreakerResult<T, E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match outcome {
            CallOutcome::Success(value) => {
                match probe {
                    Some(guard) => guard.succeed(),
                    None => state.record_success(),
                }
                debug!("Circuit breaker: operation succeeded");
                Ok(value)
            }
            CallOutcome::Failure(source) => {
                let now = self.clock.now();
                match probe {
                    Some(guard) => guard.fail(now),
                    None => state.record_failure(&self.settings, now),
                }
                warn!("Circuit breaker: operation failed - {}", source);
                Err(BreakerError::Operation { source })
            }
            CallOutcome::TimedOut { timeout } => {
                let now = self.clock.now();
                match probe {
                    Some(guard) => guard.fail(now),
                    None => state.record_failure(&self.settings, now),
                }
                warn!("Circuit breaker: operation timed out after {:?}", timeout);
                Err(BreakerError::Timeout { timeout })
            }
        }
    }

    /// Get the settings this handle applies
    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    /// Get the current circuit state for an endpoint
    ///
    /// Obtains the endpoint's breaker lazily, so querying an endpoint that
    /// has never been called reports `Closed`.
    pub fn state(&self, target: &EndpointId) -> CircuitState {
        self.registry.obtain(target).state()
    }

    /// Get a point-in-time snapshot of an endpoint's breaker
    pub fn snapshot(&self, target: &EndpointId) -> BreakerSnapshot {
        self.registry.obtain(target).snapshot()
    }

    /// Reset an endpoint's breaker to the closed state
    pub fn reset(&self, target: &EndpointId) {
        self.registry.obtain(target).reset();
    }
}
