//! Integration tests for the Pokedex public interface.
//!
//! These drive the collection store and the discovery cache together through
//! [`Pokedex`], with an in-process catalog standing in for PokeAPI.

use async_trait::async_trait;
use pokedex_core::models::{NamedResource, PokemonResponse};
use pokedex_core::network::ListPage;
use pokedex_core::{
    AppConfig, CatalogClient, Collection, FileStore, KeyValueStore, LoadOutcome, MemoryStore,
    Pokedex, PokedexError, Pokemon, Result,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const SPECIES: &[(&str, &str)] = &[
    ("bulbasaur", "grass"),
    ("ivysaur", "grass"),
    ("venusaur", "grass"),
    ("charmander", "fire"),
    ("charmeleon", "fire"),
];

/// Upstream-shaped catalog of the first few species.
#[derive(Default)]
struct StarterCatalog {
    list_calls: AtomicU32,
}

impl StarterCatalog {
    fn detail_json(id: usize, name: &str, kind: &str) -> String {
        format!(
            r#"{{
                "id": {id},
                "name": "{name}",
                "sprites": {{"front_default": "https://img/{id}.png", "other": {{}}}},
                "types": [{{"slot": 1, "type": {{"name": "{kind}", "url": ""}}}}],
                "stats": [{{"base_stat": 45, "stat": {{"name": "hp", "url": ""}}}}]
            }}"#
        )
    }
}

#[async_trait]
impl CatalogClient for StarterCatalog {
    async fn list_page(&self, offset: u32, limit: u32) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let start = (offset as usize).min(SPECIES.len());
        let end = (start + limit as usize).min(SPECIES.len());
        let results = SPECIES[start..end]
            .iter()
            .map(|(name, _)| NamedResource {
                name: name.to_string(),
                url: String::new(),
            })
            .collect();
        let next =
            (end < SPECIES.len()).then(|| format!("/pokemon?offset={}&limit={}", end, limit));
        Ok(ListPage { results, next })
    }

    async fn get_detail(&self, name_or_id: &str) -> Result<Pokemon> {
        let index = SPECIES
            .iter()
            .position(|(name, _)| *name == name_or_id)
            .or_else(|| name_or_id.parse::<usize>().ok().and_then(|id| id.checked_sub(1)))
            .filter(|i| *i < SPECIES.len())
            .ok_or_else(|| PokedexError::HttpStatus {
                url: format!("/pokemon/{}", name_or_id),
                status: 404,
            })?;
        let (name, kind) = SPECIES[index];
        let raw: PokemonResponse =
            serde_json::from_str(&Self::detail_json(index + 1, name, kind))?;
        raw.into_pokemon()
    }
}

fn pokedex_with(store: Arc<dyn KeyValueStore>, page_size: u32) -> (Pokedex, Arc<StarterCatalog>) {
    let catalog = Arc::new(StarterCatalog::default());
    let pokedex = Pokedex::builder()
        .store(store)
        .catalog(catalog.clone())
        .page_size(page_size)
        .build()
        .unwrap();
    (pokedex, catalog)
}

#[tokio::test]
async fn test_browse_collect_reorder_remove() {
    let backing = Arc::new(MemoryStore::new());
    let (pokedex, _) = pokedex_with(backing.clone(), 2);
    assert_eq!(pokedex.collection().count(), 0);
    assert!(pokedex.discovery().is_empty());

    let outcome = pokedex.discovery().load_more().await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Loaded { offset: 0, added: 2, .. }));

    let feed = pokedex.discovery().entities();
    assert_eq!(feed.len(), 2);
    assert_eq!((feed[0].id, feed[0].name.as_str()), (1, "Bulbasaur"));
    assert_eq!((feed[1].id, feed[1].name.as_str()), (2, "Ivysaur"));
    assert_eq!(feed[0].type_label(), "GRASS");

    let added = pokedex.collect_from_feed(1).unwrap();
    assert!(added.is_persisted());
    assert_eq!(added.value.ids(), vec![1]);
    assert_eq!(added.value.as_slice()[0].name, "Bulbasaur");

    let reordered = pokedex.collection().reorder(0, 0).unwrap();
    assert_eq!(reordered.value.ids(), vec![1]);

    let removed = pokedex.collection().remove(1);
    assert!(removed.value.is_empty());
    assert_eq!(
        backing.get(AppConfig::COLLECTION_KEY).unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn test_feed_pages_until_exhausted() {
    let (pokedex, catalog) = pokedex_with(Arc::new(MemoryStore::new()), 2);
    let discovery = pokedex.discovery();

    while discovery.has_more() {
        discovery.load_more().await.unwrap();
    }
    assert_eq!(discovery.load_more().await.unwrap(), LoadOutcome::Exhausted);
    assert_eq!(catalog.list_calls.load(Ordering::SeqCst), 3);

    let ids: Vec<u32> = discovery.entities().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(discovery.pages().last().unwrap().is_last);
}

#[tokio::test]
async fn test_collect_by_name_skips_known_ids() {
    let (pokedex, _) = pokedex_with(Arc::new(MemoryStore::new()), 2);

    let first = pokedex
        .collect(&["charmander".to_string(), "1".to_string()])
        .await
        .unwrap();
    assert_eq!(first.value.ids(), vec![4, 1]);

    let again = pokedex
        .collect(&["1".to_string(), "charmander".to_string()])
        .await
        .unwrap();
    assert_eq!(again.value.ids(), vec![4, 1]);

    let missing = pokedex.collect(&["missingno".to_string()]).await;
    assert!(matches!(
        missing,
        Err(PokedexError::HttpStatus { status: 404, .. })
    ));
    assert_eq!(pokedex.collection().ids(), vec![4, 1]);
}

#[tokio::test]
async fn test_collection_survives_restart_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(temp_dir.path()));

    {
        let (pokedex, _) = pokedex_with(store.clone(), 5);
        pokedex.discovery().load_more().await.unwrap();
        for id in [3, 1, 5] {
            pokedex.collect_from_feed(id).unwrap();
        }
        pokedex.collection().reorder(2, 0).unwrap();
        assert_eq!(pokedex.collection().ids(), vec![5, 3, 1]);
    }

    let (reopened, _) = pokedex_with(store, 5);
    assert!(reopened.collection().load_fault().is_none());
    assert_eq!(reopened.collection().ids(), vec![5, 3, 1]);
    assert_eq!(reopened.collection().get(5).unwrap().name, "Charmeleon");
}

#[tokio::test]
async fn test_corrupt_file_recovers_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join(format!("{}.json", AppConfig::COLLECTION_KEY)),
        "[{\"id\": 1, \"name\": ",
    )
    .unwrap();

    let (pokedex, _) = pokedex_with(Arc::new(FileStore::new(temp_dir.path())), 2);
    assert_eq!(pokedex.collection().snapshot(), Collection::new());
    assert!(pokedex
        .collection()
        .load_fault()
        .is_some_and(PokedexError::is_storage));

    pokedex.discovery().load_more().await.unwrap();
    assert!(pokedex.collect_from_feed(2).unwrap().is_persisted());
    assert_eq!(pokedex.collection().load().value.ids(), vec![2]);
}

#[test]
fn test_builder_in_memory() {
    let pokedex = Pokedex::builder()
        .in_memory(true)
        .catalog(Arc::new(StarterCatalog::default()))
        .build()
        .unwrap();
    assert_eq!(pokedex.collection().count(), 0);
    assert!(pokedex.collection().load_fault().is_none());
    assert!(pokedex.collect_from_feed(1).is_none());
}
