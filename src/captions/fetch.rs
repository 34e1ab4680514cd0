// Outbound HTTP and bounded retry
//
// `HttpClient` is the seam between the probe logic and the network: the
// production client wraps reqwest, tests plug in canned responses.

use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;

use super::config::ProbeConfig;
use super::errors::FetchError;

/// Minimal GET-as-text client
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch `url` and return the body. Non-2xx is an error.
    async fn get_text(&self, url: &str, user_agent: &str) -> Result<String, FetchError>;
}

/// reqwest-backed client with per-call timeout and optional proxy
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(config: &ProbeConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds));

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| FetchError::Transport(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get_text(&self, url: &str, user_agent: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Attempt budget and backoff for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_base_delay,
        }
    }

    /// Delay after the `failed`-th failed attempt (1-based): base * 2^(failed-1)
    pub fn delay_after(&self, failed: u32) -> Duration {
        let exponent = failed.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

/// Run `op` up to `policy.max_attempts` times with exponential backoff.
/// Returns the last error once attempts are exhausted.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                debug!("[Fetch] giving up after {} attempts: {}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "[Fetch] attempt {}/{} failed: {} (retrying in {:?})",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// GET with retry through any `HttpClient`
pub async fn fetch_text(
    http: &dyn HttpClient,
    policy: RetryPolicy,
    url: &str,
    user_agent: &str,
) -> Result<String, FetchError> {
    with_retry(policy, || http.get_text(url, user_agent)).await
}
