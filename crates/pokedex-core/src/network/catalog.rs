//! Remote catalog client.
//!
//! [`CatalogClient`] is the contract the discovery cache consumes. Clients do
//! not retry; the caller owns the retry policy.

use crate::config::NetworkConfig;
use crate::models::{ListResponse, NamedResource, Pokemon, PokemonResponse};
use crate::network::client::HttpClient;
use crate::Result;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

/// One page of summaries from the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub results: Vec<NamedResource>,
    /// URL of the next page, `None` once the catalog is exhausted.
    pub next: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

impl From<ListResponse> for ListPage {
    fn from(response: ListResponse) -> Self {
        Self {
            results: response.results,
            next: response.next,
        }
    }
}

/// Source of catalog pages and entity details.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// List `limit` summaries starting at `offset`.
    async fn list_page(&self, offset: u32, limit: u32) -> Result<ListPage>;

    /// Fetch and normalize one entity.
    async fn get_detail(&self, name_or_id: &str) -> Result<Pokemon>;

    /// Fetch several entities concurrently. Fails as a whole if any fails;
    /// results keep the order of `names`.
    async fn get_batch(&self, names: &[String]) -> Result<Vec<Pokemon>> {
        try_join_all(names.iter().map(|name| self.get_detail(name))).await
    }
}

/// Shared handle to a catalog client.
pub type DynCatalogClient = Arc<dyn CatalogClient>;

/// [`CatalogClient`] backed by the public PokeAPI.
pub struct PokeApiClient {
    http: Arc<HttpClient>,
    base_url: String,
}

impl PokeApiClient {
    /// Create a client against the public PokeAPI.
    pub fn new() -> Result<Self> {
        Self::with_base_url(NetworkConfig::POKEAPI_BASE)
    }

    /// Create a client against a custom base URL (mirrors, local fixtures).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: Arc::new(HttpClient::new()?),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_url(&self, offset: u32, limit: u32) -> String {
        format!("{}/pokemon?offset={}&limit={}", self.base_url, offset, limit)
    }

    fn detail_url(&self, name_or_id: &str) -> String {
        format!(
            "{}/pokemon/{}",
            self.base_url,
            urlencoding::encode(&name_or_id.trim().to_lowercase())
        )
    }
}

#[async_trait]
impl CatalogClient for PokeApiClient {
    async fn list_page(&self, offset: u32, limit: u32) -> Result<ListPage> {
        let url = self.list_url(offset, limit);
        debug!("Listing catalog page: {}", url);
        let response: ListResponse = self.http.get_json(&url).await?;
        Ok(response.into())
    }

    async fn get_detail(&self, name_or_id: &str) -> Result<Pokemon> {
        let url = self.detail_url(name_or_id);
        let response: PokemonResponse = self.http.get_json(&url).await?;
        response.into_pokemon()
    }
}
