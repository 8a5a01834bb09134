//! Bounded execution of guarded operations
//!
//! The executor runs the underlying operation raced against a deadline and
//! reports a [`CallOutcome`]. It never touches breaker state itself; the
//! facade feeds the outcome back into the state machine. That separation
//! keeps the executor reusable and independently testable.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Result of one guarded operation run
///
/// A timeout counts as a failure for the state machine, but stays a distinct
/// variant so diagnostics can tell a slow dependency from a broken one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome<T, E> {
    /// Operation completed before the deadline
    Success(T),
    /// Operation returned an error
    Failure(E),
    /// Deadline elapsed before the operation completed
    TimedOut { timeout: Duration },
}

impl<T, E> CallOutcome<T, E> {
    /// Whether the operation completed successfully
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the outcome counts as a failure (error or timeout)
    pub const fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

/// Runs operations under a bounded timeout
///
/// Stateless: one executor can serve any number of concurrent calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallExecutor;

impl CallExecutor {
    /// Create a new executor
    pub const fn new() -> Self {
        Self
    }

    /// Run `operation` raced against `timeout`
    ///
    /// When the deadline elapses first, the operation's future is dropped:
    /// the caller gets a timeout outcome promptly, while cancellation of any
    /// remote side effect is best-effort.
    pub async fn execute<F, Fut, T, E>(&self, operation: F, timeout: Duration) -> CallOutcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => CallOutcome::Success(value),
            Ok(Err(error)) => CallOutcome::Failure(error),
            Err(_) => {
                debug!("Operation exceeded deadline of {:?}", timeout);
                CallOutcome::TimedOut { timeout }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[derive(Debug, PartialEq, Eq, thiserror::Error)]
    #[error("operation failed")]
    struct OpError;

    #[tokio::test]
    async fn test_execute_success() {
        let executor = CallExecutor::new();
        let outcome: CallOutcome<u32, OpError> =
            executor.execute(|| async { Ok(42) }, Duration::from_millis(100)).await;

        assert_eq!(outcome, CallOutcome::Success(42));
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn test_execute_failure() {
        let executor = CallExecutor::new();
        let outcome: CallOutcome<u32, OpError> =
            executor.execute(|| async { Err(OpError) }, Duration::from_millis(100)).await;

        assert_eq!(outcome, CallOutcome::Failure(OpError));
        assert!(outcome.is_failure());
    }

    /// A never-completing operation must resolve as a timeout once the
    /// deadline elapses, carrying the deadline for diagnostics.
    #[tokio::test]
    async fn test_execute_timeout() {
        let executor = CallExecutor::new();
        let timeout = Duration::from_millis(20);
        let outcome: CallOutcome<u32, OpError> = executor
            .execute(
                || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(1)
                },
                timeout,
            )
            .await;

        assert_eq!(outcome, CallOutcome::TimedOut { timeout });
        assert!(outcome.is_failure());
    }

    /// The timeout applies to the operation, not to anything before it: a
    /// fast call well under the deadline is unaffected.
    #[test]
    fn test_fast_call_unaffected_by_deadline() {
        tokio_test::block_on(async {
            let executor = CallExecutor::new();
            let outcome: CallOutcome<&str, Infallible> =
                executor.execute(|| async { Ok("ok") }, Duration::from_secs(5)).await;

            assert_eq!(outcome, CallOutcome::Success("ok"));
        });
    }
}
