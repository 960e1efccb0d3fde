//! Network utilities for talking to the remote catalog.
//!
//! This module provides:
//! - Retry logic with exponential backoff
//! - HTTP client with rate limiting awareness
//! - The catalog client contract and its PokeAPI implementation

mod catalog;
mod client;
mod retry;

pub use catalog::{CatalogClient, DynCatalogClient, ListPage, PokeApiClient};
pub use client::{extract_domain, HttpClient, RateLimitState};
pub use retry::{retry_async, RetryConfig, RetryStats};
