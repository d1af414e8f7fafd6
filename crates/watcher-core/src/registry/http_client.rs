use bytes::Bytes;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::registry::RegistryError;

/// Configuration for registry HTTP access.
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    /// Timeout applied to each existence probe (HEAD).
    pub probe_timeout: Duration,
    /// Timeout applied to each full document fetch (GET).
    pub request_timeout: Duration,
    /// Maximum number of concurrent requests across all callers.
    pub concurrent_limit: usize,
    pub user_agent: String,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(5),
            concurrent_limit: 32,
            user_agent: concat!("upgrade-watcher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Result of a lightweight existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Upstream answered 2xx.
    Exists,
    /// Upstream answered with a 4xx status, which is a definitive "no".
    Missing(u16),
    /// Transport failure or 5xx. Nothing can be concluded about existence.
    Inconclusive(RegistryError),
}

/// HTTP client used for every registry and upgrade-source request.
///
/// Wraps a single pooled `reqwest::Client` and caps in-flight requests with a
/// semaphore so a wide fan-out cannot open an unbounded number of connections.
pub struct RegistryClient {
    client: Client,
    permits: Arc<Semaphore>,
    config: RegistryClientConfig,
}

/// Holds a request permit for the lifetime of one HTTP exchange.
struct PermitGuard {
    _permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        tracing::trace!(
            available_permits = self.semaphore.available_permits(),
            "registry request permit released"
        );
    }
}

impl RegistryClient {
    /// Creates a client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Transport`] if the underlying reqwest client fails to build.
    pub fn new(config: RegistryClientConfig) -> Result<Self, RegistryError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .connect_timeout(config.probe_timeout)
            .timeout(config.request_timeout)
            .use_rustls_tls()
            .user_agent(config.user_agent.clone())
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build registry http client");
                RegistryError::Transport(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.concurrent_limit.max(1))),
            config,
        })
    }

    /// Returns the underlying reqwest client for collaborators that need plain HTTP.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &RegistryClientConfig {
        &self.config
    }

    /// Maps reqwest failures to short messages that do not leak internal details.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else {
            "network error".to_string()
        }
    }

    async fn acquire(&self, url: &str) -> Result<PermitGuard, RegistryError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| {
            tracing::warn!(url = url, "registry client semaphore closed");
            RegistryError::Transport("request limiter closed".to_string())
        })?;
        Ok(PermitGuard { _permit: permit, semaphore: Arc::clone(&self.permits) })
    }

    /// Issues a HEAD request bounded by the probe timeout.
    ///
    /// Never returns an error: every outcome, including transport failures, is
    /// folded into a [`ProbeOutcome`] so the resolver can keep probing.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let _guard = match self.acquire(url).await {
            Ok(guard) => guard,
            Err(e) => return ProbeOutcome::Inconclusive(e),
        };

        let result = self.client.head(url).timeout(self.config.probe_timeout).send().await;

        match result {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(url = url, status = status.as_u16(), "registry probe");
                if status.is_success() {
                    ProbeOutcome::Exists
                } else if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                    ProbeOutcome::Missing(status.as_u16())
                } else {
                    ProbeOutcome::Inconclusive(RegistryError::UpstreamStatus(
                        status.as_u16(),
                        url.to_string(),
                    ))
                }
            }
            Err(e) => {
                tracing::debug!(url = url, error = %e, "registry probe failed");
                ProbeOutcome::Inconclusive(RegistryError::Transport(format!(
                    "{}: {url}",
                    Self::sanitize_network_error(&e)
                )))
            }
        }
    }

    /// Fetches a full document body.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Transport`] for network-level failures and timeouts
    /// - [`RegistryError::UpstreamStatus`] for non-2xx status codes
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes, RegistryError> {
        let _guard = self.acquire(url).await?;

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::debug!(url = url, error = %e, "registry fetch failed");
            RegistryError::Transport(format!("{}: {url}", Self::sanitize_network_error(&e)))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::UpstreamStatus(status.as_u16(), url.to_string()));
        }

        response.bytes().await.map_err(|e| {
            RegistryError::Transport(format!("{}: {url}", Self::sanitize_network_error(&e)))
        })
    }

    /// Fetches a document and decodes it as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`get_bytes`](Self::get_bytes), plus [`RegistryError::Decode`] when the
    /// body is not valid JSON for `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RegistryError> {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body)
            .map_err(|e| RegistryError::Decode(format!("{url}: {e}")))
    }
}
