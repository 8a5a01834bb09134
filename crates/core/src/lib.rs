//! Circuit breaker core for guarding outbound calls.
//!
//! Wraps each call to an unreliable dependency with a stateful guard: recent
//! failures are counted per endpoint identity, the circuit opens once a
//! threshold is crossed, and calls are denied (routed to a fallback) until a
//! cool-down elapses and a single probe call tests recovery.
//!
//! The pieces compose bottom-up:
//! - [`FailureCounter`] tracks consecutive failures for one endpoint
//! - [`BreakerState`] is the Closed/Open/HalfOpen machine; `admit()` is the
//!   single gating decision point
//! - [`CallExecutor`] runs an operation raced against a deadline
//! - [`CircuitBreaker`] is the facade callers use: gate, execute, record,
//!   fall back on denial
//! - [`CircuitBreakerFactory`] validates settings and owns the shared
//!   per-endpoint state
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use breakwater_core::{BreakerSettings, CircuitBreakerFactory, EndpointId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = CircuitBreakerFactory::new();
//! let breaker = factory.create(
//!     BreakerSettings::builder()
//!         .max_failures(2)
//!         .call_timeout(Duration::from_millis(600))
//!         .cool_down(Duration::from_secs(3600))
//!         .build()?,
//! )?;
//!
//! let target = EndpointId::new("https://service.example/feed");
//! let value = breaker
//!     .call(
//!         &target,
//!         || async {
//!             // The real outbound operation
//!             Ok::<_, std::io::Error>("fresh")
//!         },
//!         // Substituted when the circuit denies the call
//!         || Ok("cached"),
//!     )
//!     .await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod breaker;
pub mod clock;
pub mod counter;
pub mod error;
pub mod executor;
pub mod factory;
pub mod settings;
pub mod state;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use breaker::CircuitBreaker;
pub use clock::{Clock, MockClock, SystemClock};
pub use counter::FailureCounter;
pub use error::{BreakerError, BreakerResult, ConfigError, ConfigResult};
pub use executor::{CallExecutor, CallOutcome};
pub use factory::{CircuitBreakerFactory, EndpointId};
pub use settings::{BreakerSettings, BreakerSettingsBuilder};
pub use state::{Admission, BreakerSnapshot, BreakerState, CircuitState, ProbeGuard};
