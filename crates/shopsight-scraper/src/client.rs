use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ExtractError;
use crate::normalize::store_domain;
use crate::rate_limit::retry_with_backoff;

/// HTTP client for a target storefront's public surface.
///
/// Wraps one `reqwest::Client` (shared connection pool, timeout, custom
/// `User-Agent`) and classifies responses into typed errors: 429 becomes
/// [`ExtractError::RateLimited`], 404 [`ExtractError::NotFound`], other
/// non-2xx [`ExtractError::UnexpectedStatus`].
///
/// Transient errors (network failures, 429, 5xx) are automatically retried
/// with exponential backoff up to `max_retries` additional attempts; 4xx and
/// malformed bodies are not retried.
pub struct StoreClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff: `backoff_base_ms * 2^attempt`.
    backoff_base_ms: u64,
}

impl StoreClient {
    /// Creates a `StoreClient` with configured timeout, `User-Agent`, and
    /// retry policy. Set `max_retries` to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Creates a `StoreClient` from the process configuration.
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::new`].
    pub fn from_config(config: &shopsight_core::AppConfig) -> Result<Self, ExtractError> {
        Self::new(
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.backoff_base_ms,
        )
    }

    /// Fetches `url` and returns the response body as text, with automatic
    /// retry on transient errors.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::NotFound`] — HTTP 404 (not retried).
    /// - [`ExtractError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ExtractError::UnexpectedStatus`] — other non-2xx (5xx retried first).
    /// - [`ExtractError::Http`] — network or TLS failure after all retries.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ExtractError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ExtractError::RateLimited {
                    domain: store_domain(url),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ExtractError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ExtractError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }

    /// Fetches `url` and deserializes the body as JSON into `T`.
    ///
    /// `context` names the payload in the error when the body fails to parse
    /// (parse failures are not retried — the body would not change).
    ///
    /// # Errors
    ///
    /// Everything [`StoreClient::fetch_text`] returns, plus
    /// [`ExtractError::Deserialize`] for a body that is not valid `T`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, ExtractError> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str::<T>(&body).map_err(|e| ExtractError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}
