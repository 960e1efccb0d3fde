//! Pokedex Core - browse the Pokemon catalog and curate a personal collection.
//!
//! Two services carry the state:
//! - [`CollectionStore`]: the persisted, ordered, deduplicated collection
//! - [`DiscoveryCache`]: the paginated, cached, retrying view of the catalog
//!
//! [`Pokedex`] wires both to a catalog client and a durable store.
//!
//! # Example
//!
//! ```rust,ignore
//! use pokedex_core::Pokedex;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> pokedex_core::Result<()> {
//!     let pokedex = Pokedex::builder().data_dir("./data").build()?;
//!
//!     pokedex.discovery().load_more().await?;
//!     let first = pokedex.discovery().entities()[0].clone();
//!     pokedex.collection().add(first);
//!
//!     println!("Collected {}", pokedex.collection().count());
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod network;
pub mod storage;

mod api;

pub use api::PokedexBuilder;
pub use collection::{Collection, CollectionStore, Persisted};
pub use config::{AppConfig, DiscoveryConfig, NetworkConfig};
pub use discovery::{
    DiscoveryCache, FeedSubscription, FetchState, Freshness, LoadOutcome, PageEntry,
    RefreshOutcome,
};
pub use error::{PokedexError, Result};
pub use models::{Pokemon, PokemonStats, PokemonType};
pub use network::{CatalogClient, DynCatalogClient, PokeApiClient};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

use std::sync::Arc;
use tracing::debug;

/// Application services with process-wide lifetime.
///
/// Built once at startup and handed to consumers by reference.
pub struct Pokedex {
    catalog: DynCatalogClient,
    collection: CollectionStore,
    discovery: Arc<DiscoveryCache>,
}

impl Pokedex {
    /// Create a builder for Pokedex.
    pub fn builder() -> PokedexBuilder {
        PokedexBuilder::new()
    }

    pub fn collection(&self) -> &CollectionStore {
        &self.collection
    }

    pub fn discovery(&self) -> &Arc<DiscoveryCache> {
        &self.discovery
    }

    pub fn catalog(&self) -> &DynCatalogClient {
        &self.catalog
    }

    /// Add a pokemon already loaded in the discovery feed.
    ///
    /// Returns `None` if the feed has no pokemon with `id`.
    pub fn collect_from_feed(&self, id: u32) -> Option<Persisted<Collection>> {
        let entity = self.discovery.entities().into_iter().find(|p| p.id == id)?;
        Some(self.collection.add(entity))
    }

    /// Look pokemon up by name or id and add them in the given order.
    ///
    /// Ids already collected are not fetched again.
    pub async fn collect(&self, names_or_ids: &[String]) -> Result<Persisted<Collection>> {
        let wanted: Vec<String> = names_or_ids
            .iter()
            .filter(|key| match key.trim().parse::<u32>() {
                Ok(id) => !self.collection.contains(id),
                Err(_) => true,
            })
            .cloned()
            .collect();

        debug!("Fetching {} pokemon to collect", wanted.len());
        let fetched = self.catalog.get_batch(&wanted).await?;

        let mut last = Persisted {
            value: self.collection.snapshot(),
            fault: None,
        };
        for pokemon in fetched {
            last = self.collection.add(pokemon);
        }
        Ok(last)
    }
}
