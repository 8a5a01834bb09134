//! Consecutive-failure counting for one endpoint identity

/// Tracks consecutive failures for one protected endpoint
///
/// Pure counter semantics: any success resets the count, any failure
/// increments it. The state machine owns one counter per endpoint and reads
/// the returned count to decide whether to trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureCounter {
    count: u32,
}

impl FailureCounter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    /// Reset the count to zero
    pub fn record_success(&mut self) {
        self.count = 0;
    }

    /// Increment the count and return the new value
    pub fn record_failure(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    /// Return the current count without mutating it
    pub const fn current_count(&self) -> u32 {
        self.count
    }
}
