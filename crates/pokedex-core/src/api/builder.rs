//! Builder for configuring Pokedex initialization.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::collection::CollectionStore;
use crate::config::{AppConfig, DiscoveryConfig};
use crate::discovery::DiscoveryCache;
use crate::error::{PokedexError, Result};
use crate::network::{DynCatalogClient, PokeApiClient};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::Pokedex;

/// Builder for configuring [`Pokedex`] initialization.
///
/// # Example
///
/// ```rust,ignore
/// use pokedex_core::Pokedex;
///
/// let pokedex = Pokedex::builder()
///     .data_dir("./pokedex-data")
///     .page_size(12)
///     .build()?;
/// ```
#[derive(Default)]
pub struct PokedexBuilder {
    data_dir: Option<PathBuf>,
    in_memory: bool,
    store: Option<Arc<dyn KeyValueStore>>,
    catalog: Option<DynCatalogClient>,
    base_url: Option<String>,
    discovery: DiscoveryConfig,
}

impl PokedexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the persisted collection.
    ///
    /// Default: the platform data directory joined with `pokedex`.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Keep the collection in memory only. Nothing survives the process.
    pub fn in_memory(mut self, enable: bool) -> Self {
        self.in_memory = enable;
        self
    }

    /// Use a custom durable store. Takes precedence over `data_dir`.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom catalog client instead of PokeAPI.
    pub fn catalog(mut self, catalog: DynCatalogClient) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// PokeAPI base URL. Ignored when a custom catalog is set.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.discovery = self.discovery.with_page_size(page_size);
        self
    }

    pub fn discovery_config(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = config;
        self
    }

    fn resolve_store(&mut self) -> Result<Arc<dyn KeyValueStore>> {
        if let Some(store) = self.store.take() {
            return Ok(store);
        }
        if self.in_memory {
            debug!("Using in-memory collection storage");
            return Ok(Arc::new(MemoryStore::new()));
        }

        let dir = match self.data_dir.take() {
            Some(dir) => dir,
            None => dirs::data_dir()
                .map(|d| d.join(AppConfig::DATA_DIR_NAME))
                .ok_or_else(|| PokedexError::Config {
                    message: "no platform data directory; pass a data dir explicitly".to_string(),
                })?,
        };
        info!("Collection storage: {}", dir.display());
        Ok(Arc::new(FileStore::new(dir)))
    }

    fn resolve_catalog(&mut self) -> Result<DynCatalogClient> {
        if let Some(catalog) = self.catalog.take() {
            return Ok(catalog);
        }
        let client = match self.base_url.take() {
            Some(url) => PokeApiClient::with_base_url(url)?,
            None => PokeApiClient::new()?,
        };
        Ok(Arc::new(client))
    }

    /// Build the Pokedex, loading the persisted collection once.
    pub fn build(mut self) -> Result<Pokedex> {
        let store = self.resolve_store()?;
        let catalog = self.resolve_catalog()?;

        let collection = CollectionStore::open(store);
        let discovery = Arc::new(DiscoveryCache::new(catalog.clone(), self.discovery));

        Ok(Pokedex {
            catalog,
            collection,
            discovery,
        })
    }
}
