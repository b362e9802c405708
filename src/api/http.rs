use anyhow::Result;
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const HTTP_TIMEOUT_SECS: u64 = 10;

// Type alias for the rate limiter to simplify signatures
pub(crate) type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Build a per-minute limiter shared by all clones of a client
pub(crate) fn per_minute_limiter(requests_per_minute: u32) -> Arc<DirectRateLimiter> {
    let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_minute(rpm)))
}

pub(crate) fn build_client() -> Result<Client> {
    use anyhow::Context;
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// Retry behaviour for provider requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping
    pub fn none() -> Self {
        Self {
            max_retries: 1,
            base_backoff: Duration::ZERO,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// GET with rate limiting and retry on 429 / 5xx / network errors
///
/// 4xx responses other than 429 fail immediately.
pub(crate) async fn get_with_retry(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
    headers: &[(&'static str, String)],
    limiter: Option<&DirectRateLimiter>,
    policy: RetryPolicy,
    source: &str,
) -> Result<Response> {
    let attempts = policy.max_retries.max(1);

    for attempt in 1..=attempts {
        if let Some(limiter) = limiter {
            limiter.until_ready().await;
        }

        let mut request = client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response);
                }

                if (status.as_u16() == 429 || status.is_server_error()) && attempt < attempts {
                    let backoff = policy.backoff(attempt);
                    tracing::warn!(
                        "{} returned {}, retrying in {:?} (attempt {}/{})",
                        source,
                        status,
                        backoff,
                        attempt,
                        attempts
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }

                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                anyhow::bail!("{} API error ({}): {}", source, status, error_text);
            }
            Err(e) if attempt < attempts => {
                let backoff = policy.backoff(attempt);
                tracing::warn!(
                    "{} network error: {}, retrying in {:?} (attempt {}/{})",
                    source,
                    e,
                    backoff,
                    attempt,
                    attempts
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => anyhow::bail!("{} network error after {} attempts: {}", source, attempts, e),
        }
    }

    anyhow::bail!("{} request failed after {} attempts", source, attempts)
}
