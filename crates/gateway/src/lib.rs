//! Circuit-protected gateway for external content providers.
//!
//! Hosts hand the gateway loosely typed call options; it validates them
//! against documented defaults (2 failures, 0.6s timeout, 1h cool-down),
//! obtains a circuit breaker for the target url from a shared
//! [`breakwater_core`] factory, and fetches the content through it. Every
//! breaker outcome maps onto a host-friendly error: a short-circuited call
//! becomes a service-unavailable condition carrying the cool-down as its
//! retry-after hint, while upstream failures and timeouts surface with
//! their cause intact.
//!
//! # Example
//!
//! ```rust,no_run
//! use breakwater_gateway::{CallOptions, ExternalContentGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = ExternalContentGateway::new()?;
//!
//! let mut options = CallOptions::new("https://addons.example/feed");
//! options.headers.insert("x-api-key".into(), "secret".into());
//!
//! match gateway.fetch(options).await {
//!     Ok(body) => println!("{body}"),
//!     Err(err) => {
//!         if let Some(retry_after) = err.retry_after() {
//!             eprintln!("circuit open, retry in {retry_after:?}");
//!         }
//!         return Err(err.into());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod client;
pub mod error;
pub mod gateway;
pub mod options;

// Re-export commonly used types for convenience
// ------------------------
pub use client::{ContentClient, ContentClientBuilder};
pub use error::{FetchError, GatewayError, OptionsError};
pub use gateway::ExternalContentGateway;
pub use options::{
    CallOptions, ResolvedCall, DEFAULT_COOL_DOWN_SECS, DEFAULT_MAX_FAILURES, DEFAULT_TIMEOUT_SECS,
};
