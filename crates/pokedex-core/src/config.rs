//! Centralized configuration for the Pokedex core.
//!
//! Constants for the application, the remote catalog and the discovery feed,
//! plus the runtime [`DiscoveryConfig`] value handed to the discovery cache.

use crate::network::RetryConfig;
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Pokedex";
    pub const DATA_DIR_NAME: &'static str = "pokedex";
    /// The single durable-store key holding the whole collection.
    pub const COLLECTION_KEY: &'static str = "pokemon_collection";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const POKEAPI_BASE: &'static str = "https://pokeapi.co/api/v2";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &'static str = "Pokedex/1.0";
    pub const THROTTLE_DELAY: Duration = Duration::from_millis(500);
}

/// Defaults for the discovery feed.
pub struct DiscoveryDefaults;

impl DiscoveryDefaults {
    pub const PAGE_SIZE: u32 = 6;
    pub const STALE_AFTER: Duration = Duration::from_secs(5 * 60);
    pub const RETAIN_FOR: Duration = Duration::from_secs(30 * 60);
    /// Attempts per page, the first one included.
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const BASE_DELAY: Duration = Duration::from_millis(1000);
    pub const MAX_DELAY: Duration = Duration::from_millis(30_000);
}

/// Runtime configuration for [`crate::discovery::DiscoveryCache`].
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Number of summaries requested per page.
    pub page_size: u32,
    /// Age after which loaded pages are considered stale.
    pub stale_after: Duration,
    /// How long unobserved pages stay resident.
    pub retain_for: Duration,
    /// Bound on every individual list or detail request.
    pub request_timeout: Duration,
    /// Whole-page retry policy.
    pub retry: RetryConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_size: DiscoveryDefaults::PAGE_SIZE,
            stale_after: DiscoveryDefaults::STALE_AFTER,
            retain_for: DiscoveryDefaults::RETAIN_FOR,
            request_timeout: NetworkConfig::REQUEST_TIMEOUT,
            retry: RetryConfig::new()
                .with_max_attempts(DiscoveryDefaults::MAX_ATTEMPTS)
                .with_base_delay(DiscoveryDefaults::BASE_DELAY)
                .with_max_delay(DiscoveryDefaults::MAX_DELAY)
                .with_jitter(false),
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_stale_after(mut self, window: Duration) -> Self {
        self.stale_after = window;
        self
    }

    pub fn with_retain_for(mut self, window: Duration) -> Self {
        self.retain_for = window;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows_are_independent() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.stale_after, Duration::from_secs(300));
        assert_eq!(config.retain_for, Duration::from_secs(1800));

        let config = config.with_stale_after(Duration::from_secs(1));
        assert_eq!(config.retain_for, Duration::from_secs(1800));
    }

    #[test]
    fn test_default_retry_matches_backoff_formula() {
        let retry = DiscoveryConfig::default().retry;
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.calculate_delay(0), Duration::from_millis(1000));
        assert_eq!(retry.calculate_delay(1), Duration::from_millis(2000));
        assert_eq!(retry.calculate_delay(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_page_size_is_positive() {
        assert_eq!(DiscoveryConfig::new().with_page_size(0).page_size, 1);
    }
}
