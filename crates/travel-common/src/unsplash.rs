use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

const API_BASE_URL: &str = "https://api.unsplash.com";
const API_VERSION: &str = "v1";

#[derive(Clone, Debug)]
pub struct UnsplashClientConfig {
    /// Provider access key. `None` disables photo search entirely.
    pub access_key: Option<String>,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl UnsplashClientConfig {
    pub fn from_env() -> Self {
        let access_key = std::env::var("UNSPLASH_ACCESS_KEY").ok().filter(|k| !k.is_empty());

        let default_timeout = std::env::var("UNSPLASH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10));

        let max_retries = std::env::var("UNSPLASH_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);

        let initial_backoff = std::env::var("UNSPLASH_RETRY_INITIAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(200));

        let max_backoff = std::env::var("UNSPLASH_RETRY_MAX_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(3_000));

        let max_error_body_bytes = std::env::var("UNSPLASH_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8 * 1024);

        Self {
            access_key,
            default_timeout,
            max_retries,
            initial_backoff,
            max_backoff,
            max_error_body_bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UnsplashClientError {
    #[error("photo search is not configured (missing access key)")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider rate limit reached")]
    RateLimited,

    #[error("provider returned error: status={status} body={body}")]
    Upstream { status: StatusCode, body: String },
}

/// One photo hit from the search endpoint. Only the fields the site
/// consumes; the provider sends many more.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoHit {
    pub urls: PhotoUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUrls {
    pub regular: String,
}

#[derive(Debug, Deserialize)]
struct SearchPhotosResponse {
    results: Vec<PhotoHit>,
}

#[derive(Clone)]
pub struct UnsplashClient {
    config: UnsplashClientConfig,
    http: reqwest::Client,
}

impl UnsplashClient {
    pub fn new(config: UnsplashClientConfig) -> Result<Self, UnsplashClientError> {
        let http = reqwest::Client::builder()
            .user_agent("travel-guides/photo-search")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn is_configured(&self) -> bool {
        self.config.access_key.is_some()
    }

    /// Search for one landscape-oriented photo matching `query`.
    ///
    /// Returns `Ok(None)` when the provider has no hits for the query.
    /// A 403 from the provider means the free-tier rate limit is exhausted;
    /// it is surfaced as `RateLimited` and never retried.
    pub async fn search_photo(&self, query: &str) -> Result<Option<PhotoHit>, UnsplashClientError> {
        let key = self
            .config
            .access_key
            .as_deref()
            .ok_or(UnsplashClientError::NotConfigured)?;
        let url = format!("{API_BASE_URL}/search/photos");

        self.request_with_retry(|| async {
            let resp = self
                .http
                .get(&url)
                .timeout(self.config.default_timeout)
                .header("Accept-Version", API_VERSION)
                .query(&[
                    ("query", query),
                    ("per_page", "1"),
                    ("orientation", "landscape"),
                    ("client_id", key),
                ])
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(self.to_upstream_error(resp).await);
            }

            let parsed = resp.json::<SearchPhotosResponse>().await?;
            Ok(parsed.results.into_iter().next())
        })
        .await
    }

    async fn to_upstream_error(&self, resp: reqwest::Response) -> UnsplashClientError {
        let status = resp.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return UnsplashClientError::RateLimited;
        }
        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
        UnsplashClientError::Upstream { status, body }
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, UnsplashClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, UnsplashClientError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "photo search failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn should_retry(err: &UnsplashClientError) -> bool {
    match err {
        UnsplashClientError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        UnsplashClientError::Upstream { status, .. } => status.is_server_error(),
        UnsplashClientError::RateLimited | UnsplashClientError::NotConfigured => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    (now.subsec_nanos() as u64) % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read provider error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let initial = Duration::from_millis(200);
        let max = Duration::from_millis(3_000);
        let d0 = backoff_delay(initial, max, 0);
        let d3 = backoff_delay(initial, max, 3);
        let d10 = backoff_delay(initial, max, 10);
        assert!(d0 >= Duration::from_millis(200));
        assert!(d3 >= Duration::from_millis(1_600));
        // cap plus at most 25% jitter
        assert!(d10 <= Duration::from_millis(3_000 + 751));
    }

    #[test]
    fn rate_limit_is_not_retried() {
        assert!(!should_retry(&UnsplashClientError::RateLimited));
        assert!(!should_retry(&UnsplashClientError::NotConfigured));
        assert!(should_retry(&UnsplashClientError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }));
        assert!(!should_retry(&UnsplashClientError::Upstream {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        }));
    }
}
