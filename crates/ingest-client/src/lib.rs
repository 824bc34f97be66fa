// In crates/ingest-client/src/lib.rs

use app_config::GeneralSettings;
use core_types::Clock;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub mod error;

// Re-export public types
pub use error::{Error, Result};

/// Fixed path segment between the base URL and the account id.
const INTEGRATION_PATH: &str = "ea-integration/trading-accounts";

/// Header carrying the ingestion API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// The ingestion endpoints the bridge posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    LiveData,
    ClosedTrades,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::LiveData => "live-data",
            Endpoint::ClosedTrades => "closed-trades",
        }
    }
}

/// Bounded retry with a fixed delay. `max_retries = 2` means up to 3 attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Everything the push client needs from the configuration.
#[derive(Clone)]
pub struct PushConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub retry: RetryPolicy,
}

impl From<&GeneralSettings> for PushConfig {
    fn from(settings: &GeneralSettings) -> Self {
        Self {
            base_url: settings.api_base_url.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.request_timeout(),
            verify_tls: !settings.disable_ssl_verification,
            retry: RetryPolicy {
                max_retries: settings.max_retries,
                delay: settings.retry_delay(),
            },
        }
    }
}

/// Posts JSON payloads to the ingestion API.
#[derive(Clone)]
pub struct PushClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    verify_tls: bool,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl PushClient {
    /// Builds the client. Retry delays are waited out on `clock`.
    pub fn new(config: PushConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            verify_tls: config.verify_tls,
            retry: config.retry,
            clock,
        })
    }

    /// `{base}/ea-integration/trading-accounts/{account_id}/{endpoint}`
    pub fn endpoint_url(&self, account_id: i64, endpoint: Endpoint) -> String {
        format!("{}/{}/{}/{}", self.base_url, INTEGRATION_PATH, account_id, endpoint.as_str())
    }

    /// Sends `payload` to `endpoint` for `account_id`.
    ///
    /// HTTP 200 and 202 count as success. Any other status or transport error
    /// fails the attempt; failed attempts are retried after the fixed delay
    /// until the policy runs out, then `Error::Exhausted` is returned.
    pub async fn push<T>(&self, endpoint: Endpoint, account_id: i64, payload: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let url = self.endpoint_url(account_id, endpoint);
        let body = serde_json::to_vec(payload)?;
        let total = self.retry.total_attempts();
        let mut last_error = String::new();

        for attempt in 1..=total {
            if attempt > 1 {
                tracing::info!(%url, retry = attempt - 1, max_retries = self.retry.max_retries, "Retrying push.");
                self.clock.sleep(self.retry.delay).await;
            }

            tracing::info!(%url, attempt, "Sending POST request.");
            if !self.verify_tls {
                tracing::warn!("TLS certificate verification is disabled; use only for development.");
            }

            match self.send_once(&url, body.clone()).await {
                Ok((status, text)) if is_accepted(status) => {
                    tracing::info!(%url, status = status.as_u16(), "Push accepted.");
                    tracing::debug!(%url, response = %text, "Push response body.");
                    return Ok(());
                }
                Ok((status, text)) => {
                    tracing::error!(%url, status = status.as_u16(), response = %text, attempt, total, "Push rejected.");
                    last_error = format!("HTTP {}", status.as_u16());
                }
                Err(e) => {
                    tracing::error!(%url, error = %e, attempt, total, "Push request failed.");
                    last_error = e.to_string();
                }
            }
        }

        tracing::error!(%url, attempts = total, "Giving up on push.");
        Err(Error::Exhausted { url, attempts: total, last_error })
    }

    async fn send_once(&self, url: &str, body: Vec<u8>) -> std::result::Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::info!(%url, status = status.as_u16(), "Received response.");
        let text = response.text().await?;
        Ok((status, text))
    }
}

fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::ACCEPTED
}
