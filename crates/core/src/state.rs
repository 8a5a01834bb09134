//! Circuit breaker state machine and call-gating protocol
//!
//! One [`BreakerState`] exists per endpoint identity. [`BreakerState::admit`]
//! is the single gating decision point: it atomically inspects the current
//! state, performs the lazy open-to-half-open transition when the cool-down
//! has elapsed, and claims the probe slot. The per-endpoint mutex is held
//! only across that decision (and across outcome recording), never while the
//! guarded operation runs, so a slow call never blocks other callers from
//! being gated.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::counter::FailureCounter;
use crate::settings::BreakerSettings;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing calls
    Closed,
    /// Circuit is open, denying calls until the cool-down elapses
    Open,
    /// Circuit is half-open, allowing a single probe call to test recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Gating decision returned by [`BreakerState::admit`]
///
/// `AllowAsProbe` carries the probe slot guard; the holder must resolve it
/// with [`ProbeGuard::succeed`] or [`ProbeGuard::fail`] once the probe's
/// outcome is known. Dropping it unresolved releases the slot so the next
/// caller can probe instead.
#[derive(Debug)]
pub enum Admission {
    /// Circuit is closed; the call proceeds normally
    Allow,
    /// Circuit is half-open; the call is the single recovery probe
    AllowAsProbe(ProbeGuard),
    /// Circuit is open (or a probe is already in flight); the call must not
    /// run
    Deny,
}

/// Point-in-time view of one breaker's state, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub opened_at: Option<Instant>,
    pub probe_in_flight: bool,
}

#[derive(Debug)]
struct StateInner {
    state: CircuitState,
    failures: FailureCounter,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    // Bumped on every probe claim and on reset so a guard from an earlier
    // window cannot release or resolve the current probe.
    probe_epoch: u64,
}

/// The per-endpoint finite-state machine (Closed, Open, HalfOpen)
///
/// Cheap to clone: clones share the same underlying state, which is how one
/// endpoint's breaker is shared between the factory registry and every
/// breaker handle calling it.
///
/// The machine itself is clock-free: callers pass `now` into the methods
/// that need it, which keeps transitions deterministic under test.
#[derive(Debug, Clone, Default)]
pub struct BreakerState {
    inner: Arc<Mutex<StateInner>>,
}

impl Default for StateInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: FailureCounter::new(),
            opened_at: None,
            probe_in_flight: false,
            probe_epoch: 0,
        }
    }
}

impl BreakerState {
    /// Create a fresh breaker state: closed, zero failures
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a call may proceed
    ///
    /// The single gating decision point. Evaluated atomically per endpoint:
    /// two concurrent callers cannot both claim the half-open probe, and the
    /// lazy open-to-half-open transition happens exactly once per cool-down
    /// window.
    pub fn admit(&self, settings: &BreakerSettings, now: Instant) -> Admission {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Admission::Allow,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_some_and(|opened_at| now.duration_since(opened_at) >= settings.cool_down);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    let guard = self.claim_probe(&mut inner);
                    debug!("Circuit breaker half-open, admitting probe call");
                    Admission::AllowAsProbe(guard)
                } else {
                    Admission::Deny
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Admission::Deny
                } else {
                    // The previous probe was abandoned without an outcome;
                    // let this caller probe instead.
                    let guard = self.claim_probe(&mut inner);
                    debug!("Probe slot free, admitting replacement probe call");
                    Admission::AllowAsProbe(guard)
                }
            }
        }
    }

    fn claim_probe(&self, inner: &mut StateInner) -> ProbeGuard {
        inner.probe_in_flight = true;
        inner.probe_epoch = inner.probe_epoch.wrapping_add(1);
        ProbeGuard { state: Some(self.clone()), epoch: inner.probe_epoch }
    }

    /// Record a successful non-probe call
    ///
    /// In the closed state this resets the failure count. An outcome that
    /// lands after the state has moved on (the circuit tripped while this
    /// call was in flight) no longer affects transitions.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => inner.failures.record_success(),
            CircuitState::Open | CircuitState::HalfOpen => {
                debug!("Ignoring late success outcome in {} state", inner.state);
            }
        }
    }

    /// Record a failed non-probe call, tripping the circuit at the threshold
    ///
    /// `now` becomes `opened_at` when this failure opens the circuit. Late
    /// failures landing in the open or half-open state are ignored for
    /// transition purposes so a stale outcome cannot extend the cool-down.
    pub fn record_failure(&self, settings: &BreakerSettings, now: Instant) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                let count = inner.failures.record_failure();
                if count >= settings.max_failures {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                    warn!("Circuit breaker opened after {} failures", count);
                }
            }
            CircuitState::Open | CircuitState::HalfOpen => {
                debug!("Ignoring late failure outcome in {} state", inner.state);
            }
        }
    }

    fn probe_succeeded(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.probe_epoch != epoch {
            debug!("Ignoring outcome from a superseded probe");
            return;
        }
        inner.probe_in_flight = false;
        inner.state = CircuitState::Closed;
        inner.failures.record_success();
        inner.opened_at = None;
        info!("Circuit breaker closed after successful probe");
    }

    fn probe_failed(&self, epoch: u64, now: Instant) {
        let mut inner = self.inner.lock();
        if inner.probe_epoch != epoch {
            debug!("Ignoring outcome from a superseded probe");
            return;
        }
        inner.probe_in_flight = false;
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        warn!("Circuit breaker reopened after failed probe");
    }

    fn probe_abandoned(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.probe_epoch != epoch {
            return;
        }
        inner.probe_in_flight = false;
        debug!("Probe abandoned without an outcome, releasing the slot");
    }

    /// Get the current state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Get a point-in-time snapshot of the breaker
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failures.current_count(),
            opened_at: inner.opened_at,
            probe_in_flight: inner.probe_in_flight,
        }
    }

    /// Reset the breaker to the closed state with a zero failure count
    ///
    /// Any outstanding probe guard is invalidated; its eventual outcome is
    /// discarded.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failures.record_success();
        inner.opened_at = None;
        inner.probe_in_flight = false;
        inner.probe_epoch = inner.probe_epoch.wrapping_add(1);
        info!("Circuit breaker manually reset to closed state");
    }
}

/// Guard for the single half-open probe slot
///
/// Exactly one guard exists per probe window. Resolving it feeds the probe's
/// outcome back into the state machine; dropping it unresolved (the probe
/// future was cancelled) releases the slot without a transition, so the
/// machine cannot wedge in the half-open state.
#[must_use = "dropping the guard releases the probe slot without recording an outcome"]
#[derive(Debug)]
pub struct ProbeGuard {
    state: Option<BreakerState>,
    epoch: u64,
}

impl ProbeGuard {
    /// Record the probe as successful, closing the circuit
    pub fn succeed(mut self) {
        if let Some(state) = self.state.take() {
            state.probe_succeeded(self.epoch);
        }
    }

    /// Record the probe as failed, reopening the circuit from `now`
    pub fn fail(mut self, now: Instant) {
        if let Some(state) = self.state.take() {
            state.probe_failed(self.epoch, now);
        }
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.probe_abandoned(self.epoch);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings() -> BreakerSettings {
        BreakerSettings {
            max_failures: 2,
            call_timeout: Duration::from_millis(600),
            cool_down: Duration::from_secs(3600),
        }
    }

    fn expect_probe(admission: Admission) -> ProbeGuard {
        match admission {
            Admission::AllowAsProbe(guard) => guard,
            other => panic!("expected probe admission, got {other:?}"),
        }
    }

    /// Validates `CircuitState` display formatting.
    ///
    /// Assertions:
    /// - Confirms `CircuitState::Closed.to_string()` equals `"CLOSED"`.
    /// - Confirms `CircuitState::Open.to_string()` equals `"OPEN"`.
    /// - Confirms `CircuitState::HalfOpen.to_string()` equals `"HALF_OPEN"`.
    #[test]
    fn test_circuit_state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "CLOSED");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
        assert_eq!(CircuitState::HalfOpen.to_string(), "HALF_OPEN");
    }

    /// Validates the initial machine state.
    ///
    /// Assertions:
    /// - Confirms a new breaker is closed with a zero failure count.
    /// - Ensures a closed breaker admits calls with `Allow`.
    #[test]
    fn test_initial_state_closed() {
        let state = BreakerState::new();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert_eq!(snapshot.opened_at, None);
        assert!(!snapshot.probe_in_flight);

        assert!(matches!(state.admit(&settings(), Instant::now()), Admission::Allow));
    }

    /// Validates the closed-to-open transition happens exactly at the
    /// threshold, never earlier.
    #[test]
    fn test_opens_exactly_at_threshold() {
        let state = BreakerState::new();
        let now = Instant::now();

        state.record_failure(&settings(), now);
        assert_eq!(state.state(), CircuitState::Closed);
        assert_eq!(state.snapshot().failure_count, 1);

        state.record_failure(&settings(), now);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.opened_at, Some(now));
    }

    /// Validates that successes reset the count so interleaved failures
    /// never accumulate to the threshold.
    #[test]
    fn test_success_resets_count_in_closed() {
        let state = BreakerState::new();
        let now = Instant::now();

        state.record_failure(&settings(), now);
        state.record_success();
        state.record_failure(&settings(), now);
        state.record_success();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
    }

    /// Validates the open state denies every call until the cool-down has
    /// elapsed, then admits exactly one probe.
    #[test]
    fn test_open_denies_until_cool_down() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);
        assert_eq!(state.state(), CircuitState::Open);

        // One second short of the window: still denied
        let early = opened + settings.cool_down - Duration::from_secs(1);
        assert!(matches!(state.admit(&settings, early), Admission::Deny));

        // Window elapsed: next admit is the probe
        let due = opened + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, due));
        assert_eq!(state.state(), CircuitState::HalfOpen);

        // A concurrent caller is denied while the probe is in flight
        assert!(matches!(state.admit(&settings, due), Admission::Deny));
        drop(guard);
    }

    /// Validates a successful probe closes the circuit and resets the count.
    #[test]
    fn test_probe_success_closes_circuit() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);

        let due = opened + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, due));
        guard.succeed();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert_eq!(snapshot.opened_at, None);
        assert!(!snapshot.probe_in_flight);
    }

    /// Validates a failed probe reopens the circuit and restarts the
    /// cool-down window from the probe's failure time.
    #[test]
    fn test_probe_failure_restarts_window() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);

        let due = opened + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, due));

        let failed_at = due + Duration::from_millis(600);
        guard.fail(failed_at);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.opened_at, Some(failed_at));

        // The old window no longer admits; the new one does
        assert!(matches!(state.admit(&settings, due + Duration::from_secs(2)), Admission::Deny));
        let next_due = failed_at + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, next_due));
        drop(guard);
    }

    /// Validates an abandoned probe (guard dropped without an outcome)
    /// releases the slot so the next caller probes instead.
    #[test]
    fn test_abandoned_probe_releases_slot() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);

        let due = opened + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, due));
        drop(guard);

        // Still half-open, but the slot is free again
        assert_eq!(state.state(), CircuitState::HalfOpen);
        let replacement = expect_probe(state.admit(&settings, due + Duration::from_secs(1)));
        replacement.succeed();
        assert_eq!(state.state(), CircuitState::Closed);
    }

    /// Validates late outcomes are ignored once the state has moved on: a
    /// failure recorded while the circuit is open must not extend the
    /// cool-down window.
    #[test]
    fn test_late_failure_does_not_extend_window() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);
        assert_eq!(state.snapshot().opened_at, Some(opened));

        // A slow in-flight call reports its failure long after the trip
        state.record_failure(&settings, opened + Duration::from_secs(120));
        assert_eq!(state.snapshot().opened_at, Some(opened));

        // The original window still admits the probe on time
        let due = opened + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, due));
        drop(guard);
    }

    /// Validates late successes are ignored in the open state rather than
    /// closing the circuit out of band.
    #[test]
    fn test_late_success_does_not_close_open_circuit() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);

        state.record_success();
        assert_eq!(state.state(), CircuitState::Open);
    }

    /// Validates `reset()` returns the machine to its initial state and
    /// invalidates an outstanding probe guard.
    #[test]
    fn test_reset_invalidates_outstanding_probe() {
        let settings = settings();
        let state = BreakerState::new();
        let opened = Instant::now();

        state.record_failure(&settings, opened);
        state.record_failure(&settings, opened);

        let due = opened + settings.cool_down;
        let guard = expect_probe(state.admit(&settings, due));

        state.reset();
        assert_eq!(state.state(), CircuitState::Closed);

        // The stale guard's outcome must not reopen the reset circuit
        guard.fail(due + Duration::from_secs(1));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert!(!snapshot.probe_in_flight);
    }

    /// Validates clones share state: recording through one handle is
    /// visible through the other.
    #[test]
    fn test_clones_share_state() {
        let settings = settings();
        let state = BreakerState::new();
        let handle = state.clone();
        let now = Instant::now();

        state.record_failure(&settings, now);
        handle.record_failure(&settings, now);

        assert_eq!(state.state(), CircuitState::Open);
        assert_eq!(handle.state(), CircuitState::Open);
    }
}
