//! Retry-wrapped API client over the injected transport.
//!
//! Every call consults the configuration provider for base URL and
//! credentials, so a rotated token takes effect on the very next request.
//! Non-2xx statuses are classified into the taxonomy, and the retry policy
//! is derived from the *first* observed failure of an attempt sequence: a
//! flaky 500 that later answers 429 never fabricates a different policy
//! mid-sequence.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{MirrorError, Result};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

const ORIGIN: &str = "transport";

/// Longest error-body excerpt carried into an error value.
const DETAIL_LIMIT: usize = 200;

/// Cut a body excerpt at the limit without splitting a UTF-8 character.
fn excerpt(body: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(body).into_owned();
    if text.len() > DETAIL_LIMIT {
        let mut cut = DETAIL_LIMIT;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

/// Configuration the client consults on each call.
///
/// Implementations must answer cheaply; the client deliberately does not
/// cache the answers across calls.
pub trait RemoteConfig: Send + Sync {
    /// Base URL of the remote service, e.g. `https://tracker.example.com`.
    fn base_url(&self) -> String;
    /// Bearer token, if the service requires one.
    fn token(&self) -> Option<String>;
}

/// A fixed configuration, for construction from a config file.
#[derive(Debug, Clone)]
pub struct StaticRemoteConfig {
    base_url: String,
    token: Option<String>,
}

impl StaticRemoteConfig {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
        }
    }
}

impl RemoteConfig for StaticRemoteConfig {
    fn base_url(&self) -> String {
        self.base_url.clone()
    }

    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// The retry-wrapped remote caller shared by every typed resource.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    config: Arc<dyn RemoteConfig>,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: Arc<dyn RemoteConfig>) -> Self {
        Self {
            transport,
            config,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry configuration (used by tests to disable jitter).
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: &Option<Vec<u8>>,
    ) -> Result<HttpRequest> {
        let base = self.config.base_url();
        if base.trim().is_empty() {
            return Err(MirrorError::configuration(
                ORIGIN,
                "remote base URL is not configured",
            ));
        }

        let url = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(token) = self.config.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let body = body.clone().unwrap_or_default();
        if !body.is_empty() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    async fn attempt(
        &self,
        method: HttpMethod,
        path: &str,
        body: &Option<Vec<u8>>,
    ) -> Result<HttpResponse> {
        // Built fresh per attempt so credential rotation is picked up.
        let request = self.build_request(method, path, body)?;

        match self.transport.send(request).await {
            Ok(resp) if resp.is_success() => Ok(resp),
            Ok(resp) => {
                let retry_after = resp
                    .header("retry-after")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                let mut detail = excerpt(&resp.body);
                if detail.is_empty() {
                    detail = path.to_string();
                }
                Err(MirrorError::from_status(
                    ORIGIN,
                    resp.status,
                    detail,
                    retry_after,
                ))
            }
            Err(TransportError::Timeout(message)) => Err(MirrorError::timeout(ORIGIN, message)),
            Err(e) => Err(MirrorError::network(ORIGIN, e.to_string())),
        }
    }

    /// Perform a call, retrying per the policy of the first failure.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse> {
        let mut policy: Option<RetryPolicy> = None;
        let mut attempt_no = 0u32;

        loop {
            attempt_no += 1;
            match self.attempt(method, path, &body).await {
                Ok(resp) => {
                    tracing::debug!(
                        method = method.as_str(),
                        path,
                        attempt = attempt_no,
                        status = resp.status,
                        "remote call succeeded"
                    );
                    return Ok(resp);
                }
                Err(err) => {
                    tracing::debug!(
                        method = method.as_str(),
                        path,
                        attempt = attempt_no,
                        category = err.tag(),
                        error = %err,
                        "remote call failed"
                    );

                    let policy = policy
                        .get_or_insert_with(|| RetryPolicy::for_kind(err.kind(), &self.retry));
                    match policy.next_delay() {
                        Some(delay) => {
                            tracing::debug!(
                                path,
                                delay_ms = delay.as_millis() as u64,
                                "retrying remote call"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::debug!(
                                method = method.as_str(),
                                path,
                                attempts = attempt_no,
                                category = err.tag(),
                                "remote call exhausted"
                            );
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    /// GET a JSON document, mapping decode failures to `Parse`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(HttpMethod::Get, path, None).await?;
        serde_json::from_slice(&resp.body).map_err(|e| {
            tracing::debug!(path, error = %e, "response body failed to decode");
            MirrorError::parse(ORIGIN, "response body", excerpt(&resp.body))
        })
    }

    /// POST a JSON document, returning the raw response.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| MirrorError::parse(ORIGIN, "request body", e.to_string()))?;
        self.send(HttpMethod::Post, path, Some(bytes)).await
    }
}
