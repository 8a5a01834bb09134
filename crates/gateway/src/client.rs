//! Thin HTTP client for fetching external content
//!
//! Wraps [`reqwest::Client`] with just enough surface for the gateway: a
//! builder for shared configuration and a single `fetch` operation. The
//! client carries no retry loop and no timeout of its own; the circuit
//! breaker decides whether a call runs at all, and its executor enforces
//! the one per-call deadline.

use reqwest::header::HeaderMap;
use reqwest::Client as ReqwestClient;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// HTTP client used by the gateway for upstream fetches.
#[derive(Clone)]
pub struct ContentClient {
    client: ReqwestClient,
}

impl ContentClient {
    /// Start building a new content client.
    pub fn builder() -> ContentClientBuilder {
        ContentClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Fetch the body at `url` with the given extra headers.
    ///
    /// Any non-success status is reported as [`FetchError::Status`]; the
    /// body is only read for successful responses.
    pub async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<String, FetchError> {
        debug!(%url, "fetching external content");

        let response = self.client.get(url.clone()).headers(headers.clone()).send().await?;

        let status = response.status();
        debug!(%url, %status, "received upstream response");

        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        Ok(response.text().await?)
    }
}

impl std::fmt::Debug for ContentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentClient").finish_non_exhaustive()
    }
}

/// Builder for [`ContentClient`].
#[derive(Debug, Default)]
pub struct ContentClientBuilder {
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl ContentClientBuilder {
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<ContentClient, FetchError> {
        // No .timeout() here: the breaker's executor enforces the deadline
        let mut builder = ReqwestClient::builder().no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        Ok(ContentClient { client: builder.build()? })
    }
}
