//! Gateway facade for circuit-protected external content fetches
//!
//! [`ExternalContentGateway`] is the host-facing surface: it resolves
//! caller options, obtains a breaker for the target url from the shared
//! factory, and runs the fetch through it. All breaker outcomes are
//! translated into [`GatewayError`]; a short-circuited call becomes
//! [`GatewayError::ServiceUnavailable`] carrying the cool-down as its
//! retry-after hint.

use breakwater_core::{
    BreakerError, CircuitBreakerFactory, Clock, EndpointId, SystemClock,
};
use tracing::{debug, instrument};

use crate::client::ContentClient;
use crate::error::{FetchError, GatewayError};
use crate::options::CallOptions;

/// Circuit-protected gateway to external content providers.
///
/// Breaker state is shared per target url across every call made through
/// the same gateway, so repeated failures against one upstream open its
/// circuit without affecting any other.
pub struct ExternalContentGateway<C: Clock = SystemClock> {
    factory: CircuitBreakerFactory<C>,
    client: ContentClient,
}

impl ExternalContentGateway<SystemClock> {
    /// Create a gateway with a fresh breaker factory and default client.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self { factory: CircuitBreakerFactory::new(), client: ContentClient::new()? })
    }
}

impl<C: Clock> ExternalContentGateway<C> {
    /// Assemble a gateway from an existing factory and client.
    pub fn with_parts(factory: CircuitBreakerFactory<C>, client: ContentClient) -> Self {
        Self { factory, client }
    }

    /// The breaker factory backing this gateway.
    pub fn factory(&self) -> &CircuitBreakerFactory<C> {
        &self.factory
    }

    /// Fetch external content according to `options`.
    ///
    /// Resolves and validates the options first, so a malformed request
    /// never reaches the breaker or the network. The per-call deadline,
    /// failure threshold, and cool-down all come from the resolved
    /// options.
    #[instrument(skip(self, options), fields(url = %options.url))]
    pub async fn fetch(&self, options: CallOptions) -> Result<String, GatewayError> {
        let resolved = options.resolve()?;
        let target = EndpointId::new(resolved.url.as_str());
        let cool_down = resolved.settings.cool_down;
        let breaker = self.factory.create(resolved.settings)?;

        let client = self.client.clone();
        let url = resolved.url;
        let headers = resolved.headers;
        let outcome = breaker
            .try_call(&target, move || async move { client.fetch(&url, &headers).await })
            .await;

        match outcome {
            Ok(body) => Ok(body),
            Err(BreakerError::Rejected) => {
                debug!(retry_after = cool_down.as_secs(), "serving service-unavailable");
                Err(GatewayError::ServiceUnavailable { retry_after: cool_down })
            }
            Err(BreakerError::Timeout { timeout }) => Err(GatewayError::Timeout { timeout }),
            Err(BreakerError::Operation { source }) => Err(GatewayError::Upstream { source }),
        }
    }

    /// Fetch external content from loosely typed options.
    ///
    /// Convenience for hosts that hand options over as JSON; see
    /// [`CallOptions::from_value`] for the rejection rules.
    pub async fn fetch_json(&self, options: serde_json::Value) -> Result<String, GatewayError> {
        self.fetch(CallOptions::from_value(options)?).await
    }
}

impl<C: Clock> Clone for ExternalContentGateway<C> {
    fn clone(&self) -> Self {
        Self { factory: self.factory.clone(), client: self.client.clone() }
    }
}

impl<C: Clock> std::fmt::Debug for ExternalContentGateway<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalContentGateway")
            .field("factory", &self.factory)
            .field("client", &self.client)
            .finish()
    }
}
