//! HTTP client for storefront crawling with rate limiting and error handling
//!
//! Provides the single fetch path every crawl goes through: realistic
//! browser identification, per-request timeout, a request-rate quota and
//! jittered retries for transient failures. An optional rendering proxy can
//! serve the same contract for JavaScript-heavy storefronts; it is a
//! configuration choice, not a separate code path.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Errors surfaced by page fetching. Every variant is recoverable at the
/// crawl level: the offending URL is skipped and the crawl continues.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not an HTML document (content-type: {content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Transient failures worth one more attempt.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Timeout { .. } | Self::NotHtml { .. } | Self::Cancelled { .. } => false,
        }
    }
}

/// Rendering proxy endpoint for storefronts that require JavaScript
/// execution. The proxy receives the target URL and the API key as query
/// parameters and returns the rendered document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingProxyConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// HTTP client configuration for crawling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub follow_redirects: bool,
    pub rendering_proxy: Option<RenderingProxyConfig>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 4,
            max_retries: 2,
            retry_base_delay_ms: 500,
            follow_redirects: true,
            rendering_proxy: None,
        }
    }
}

/// Rate-limited HTTP client for respectful storefront crawling.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        if let Some(proxy) = &config.rendering_proxy {
            if proxy.endpoint.trim().is_empty() || proxy.api_key.trim().is_empty() {
                anyhow::bail!("rendering proxy requires both an endpoint and an api key");
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The URL actually requested: either the target itself, or the rendering
    /// proxy endpoint carrying the target as a query parameter.
    fn request_url(&self, target: &str) -> String {
        match &self.config.rendering_proxy {
            Some(proxy) => {
                match url::Url::parse_with_params(
                    &proxy.endpoint,
                    &[("api_key", proxy.api_key.as_str()), ("url", target)],
                ) {
                    Ok(u) => u.to_string(),
                    Err(e) => {
                        warn!("Invalid rendering proxy endpoint, fetching directly: {e}");
                        target.to_string()
                    }
                }
            }
            None => target.to_string(),
        }
    }

    async fn send(&self, url: &str) -> Result<Response, FetchError> {
        let request_url = self.request_url(url);
        let mut attempt = 0u32;
        loop {
            self.rate_limiter.until_ready().await;
            let result = self
                .client
                .get(&request_url)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))
                .and_then(|response| {
                    let status = response.status();
                    if status.is_success() {
                        Ok(response)
                    } else {
                        Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        })
                    }
                });

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let base = self.config.retry_base_delay_ms * 2u64.pow(attempt - 1);
                    let jitter = fastrand::u64(0..=base / 2);
                    debug!("Retrying {url} (attempt {attempt}) in {}ms: {e}", base + jitter);
                    tokio::time::sleep(Duration::from_millis(base + jitter)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch a URL and return its HTML body.
    ///
    /// Fails with `FetchError::NotHtml` when the response does not declare an
    /// HTML content type, so binary assets and API endpoints reached through
    /// the frontier are skipped cheaply.
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching URL: {url}");
        let response = self.send(url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.to_ascii_lowercase().contains("text/html") {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!("Fetched {url} ({} bytes)", text.len());
        Ok(text)
    }

    /// `fetch_html` with cooperative cancellation: a cancelled token aborts
    /// the request and surfaces `FetchError::Cancelled`.
    pub async fn fetch_html_with_cancellation(
        &self,
        url: &str,
        token: CancellationToken,
    ) -> Result<String, FetchError> {
        tokio::select! {
            result = self.fetch_html(url) => result,
            _ = token.cancelled() => {
                warn!("Fetch cancelled for URL: {url}");
                Err(FetchError::Cancelled { url: url.to_string() })
            }
        }
    }

    /// Fetch a URL expected to return a JSON body (structured product feeds).
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        debug!("Fetching JSON from: {url}");
        let response = self.send(url).await?;
        response
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_client() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn proxy_without_key_is_a_configuration_error() {
        let config = HttpClientConfig {
            rendering_proxy: Some(RenderingProxyConfig {
                endpoint: "https://render.example.com/v1".to_string(),
                api_key: "  ".to_string(),
            }),
            ..Default::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[test]
    fn proxy_wraps_target_url() {
        let config = HttpClientConfig {
            rendering_proxy: Some(RenderingProxyConfig {
                endpoint: "https://render.example.com/v1".to_string(),
                api_key: "secret".to_string(),
            }),
            ..Default::default()
        };
        let client = HttpClient::new(config).unwrap();
        let wrapped = client.request_url("https://shop.example.com/collections/all");
        assert!(wrapped.starts_with("https://render.example.com/v1?"));
        assert!(wrapped.contains("api_key=secret"));
        assert!(wrapped.contains("url=https%3A%2F%2Fshop.example.com"));
    }

    #[test]
    fn direct_fetch_uses_target_url() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        assert_eq!(
            client.request_url("https://shop.example.com/"),
            "https://shop.example.com/"
        );
    }
}
