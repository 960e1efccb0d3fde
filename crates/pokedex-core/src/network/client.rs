//! HTTP client with rate limiting awareness.
//!
//! Wraps reqwest with:
//! - Rate limit tracking from response headers
//! - Throttling when approaching the limit
//! - A per-client request timeout
//! - Status-to-error mapping for JSON endpoints

use crate::config::NetworkConfig;
use crate::{PokedexError, Result};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
    /// Unix timestamp when the rate limit resets.
    pub reset: Option<u64>,
}

impl RateLimitState {
    /// Throttle when below 10% of the limit.
    pub fn should_throttle(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                let threshold = (limit as f64 * 0.1) as u64;
                remaining < threshold.max(1)
            }
            _ => false,
        }
    }
}

/// HTTP client with rate limiting awareness.
pub struct HttpClient {
    client: Client,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    rate_limit_reset: AtomicU64,
    timeout: Duration,
    throttle_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| PokedexError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            rate_limit_reset: AtomicU64::new(0),
            timeout,
            throttle_delay: NetworkConfig::THROTTLE_DELAY,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the current rate limit state.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        let reset = self.rate_limit_reset.load(Ordering::SeqCst);
        RateLimitState {
            remaining: (remaining >= 0).then_some(remaining as u64),
            limit: (limit > 0).then_some(limit),
            reset: (reset > 0).then_some(reset),
        }
    }

    /// Make a GET request. Non-success statuses are returned as errors.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.maybe_throttle().await;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PokedexError::Timeout(self.timeout)
            } else {
                PokedexError::Network {
                    message: format!("GET {} failed", url),
                    cause: Some(e.to_string()),
                }
            }
        })?;

        self.update_rate_limits(&response);
        Self::check_response_status(response, url)
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        response.json::<T>().await.map_err(|e| PokedexError::Validation {
            field: url.to_string(),
            message: format!("Malformed response body: {}", e),
        })
    }

    /// Check if an HTTP status code indicates a retryable error.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
    }

    async fn maybe_throttle(&self) {
        let state = self.rate_limit_state();
        if state.should_throttle() {
            warn!(
                "Rate limit approaching (remaining: {:?}/{:?}), throttling for {:?}",
                state.remaining, state.limit, self.throttle_delay
            );
            tokio::time::sleep(self.throttle_delay).await;
        }
    }

    fn update_rate_limits(&self, response: &Response) {
        let headers = response.headers();
        let header_num = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };

        if let Some(remaining) = header_num("X-RateLimit-Remaining") {
            self.rate_limit_remaining
                .store(remaining.min(i64::MAX as u64) as i64, Ordering::SeqCst);
        }
        if let Some(limit) = header_num("X-RateLimit-Limit") {
            self.rate_limit_limit.store(limit, Ordering::SeqCst);
        }
        if let Some(reset) = header_num("X-RateLimit-Reset") {
            self.rate_limit_reset.store(reset, Ordering::SeqCst);
        }

        let state = self.rate_limit_state();
        if let (Some(remaining), Some(limit)) = (state.remaining, state.limit) {
            debug!("Rate limit: {}/{}", remaining, limit);
        }
    }

    fn check_response_status(response: Response, url: &str) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            return Err(PokedexError::RateLimited {
                service: extract_domain(url),
                retry_after_secs: retry_after,
            });
        }

        Err(PokedexError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_state_throttle() {
        let state = RateLimitState {
            remaining: Some(5),
            limit: Some(100),
            reset: None,
        };
        assert!(state.should_throttle());

        let state = RateLimitState {
            remaining: Some(50),
            limit: Some(100),
            reset: None,
        };
        assert!(!state.should_throttle());
    }

    #[test]
    fn test_rate_limit_state_no_throttle_without_data() {
        assert!(!RateLimitState::default().should_throttle());
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://pokeapi.co/api/v2/pokemon?offset=0&limit=6"),
            "pokeapi.co"
        );
        assert_eq!(extract_domain("invalid-url"), "unknown");
    }

    #[test]
    fn test_retryable_status_codes() {
        assert!(HttpClient::is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(HttpClient::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(HttpClient::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(HttpClient::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));

        assert!(!HttpClient::is_retryable_status(StatusCode::OK));
        assert!(!HttpClient::is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_client_with_timeout() {
        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(client.rate_limit_state().remaining, None);
    }
}
