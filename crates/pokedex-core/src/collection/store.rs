//! Persisted collection store.
//!
//! The store owns the in-memory collection and writes the whole value to the
//! durable store after every change. Storage trouble never blocks the user:
//! a failed read yields an empty collection and a failed write leaves the
//! in-memory value authoritative for the session. Both cases are reported as
//! a fault on the returned [`Persisted`] value and logged at `warn`.

use super::list::Collection;
use crate::config::AppConfig;
use crate::models::Pokemon;
use crate::storage::KeyValueStore;
use crate::{PokedexError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// A value together with the storage fault hit while producing it.
#[derive(Debug)]
pub struct Persisted<T> {
    pub value: T,
    pub fault: Option<PokedexError>,
}

impl<T> Persisted<T> {
    fn clean(value: T) -> Self {
        Self { value, fault: None }
    }

    fn with_fault(value: T, fault: Option<PokedexError>) -> Self {
        Self { value, fault }
    }

    /// True when the durable store agrees with `value`.
    pub fn is_persisted(&self) -> bool {
        self.fault.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

struct StoreState {
    collection: Collection,
    last_write_error: Option<String>,
}

/// Single source of truth for the user's collection.
///
/// Every operation runs read-modify-persist under one lock with no await
/// point, so concurrent callers are observed in call order.
pub struct CollectionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    state: Mutex<StoreState>,
    load_fault: Option<PokedexError>,
}

impl CollectionStore {
    /// Open the store under the default key, loading the persisted collection once.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        Self::open_with_key(store, AppConfig::COLLECTION_KEY)
    }

    /// Open the store under a custom key.
    pub fn open_with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let loaded = read_collection(store.as_ref(), &key);
        info!(
            "Opened collection '{}' with {} entries",
            key,
            loaded.value.len()
        );

        Self {
            store,
            key,
            state: Mutex::new(StoreState {
                collection: loaded.value,
                last_write_error: None,
            }),
            load_fault: loaded.fault,
        }
    }

    /// The fault hit while opening, if the persisted collection was unreadable.
    pub fn load_fault(&self) -> Option<&PokedexError> {
        self.load_fault.as_ref()
    }

    /// Message of the most recent failed write, cleared by the next good one.
    pub fn last_write_error(&self) -> Option<String> {
        self.lock().last_write_error.clone()
    }

    /// Read the collection from the durable store.
    ///
    /// Missing data is an empty collection with no fault; unreadable or
    /// unparseable data is an empty collection with a fault.
    pub fn load(&self) -> Persisted<Collection> {
        read_collection(self.store.as_ref(), &self.key)
    }

    /// Replace the whole collection and write it.
    pub fn save(&self, collection: Collection) -> Persisted<Collection> {
        let mut state = self.lock();
        state.collection = collection;
        self.commit(&mut state)
    }

    /// Append `entity` unless its id is already present.
    pub fn add(&self, entity: Pokemon) -> Persisted<Collection> {
        let mut state = self.lock();
        let id = entity.id;
        if !state.collection.insert(entity) {
            debug!("Pokemon {} already collected", id);
            return self.settle(&mut state);
        }
        debug!("Added pokemon {} to collection", id);
        self.commit(&mut state)
    }

    /// Remove the entry with `id`. Absent ids are not an error.
    pub fn remove(&self, id: u32) -> Persisted<Collection> {
        let mut state = self.lock();
        if state.collection.remove(id) {
            debug!("Removed pokemon {} from collection", id);
        }
        self.commit(&mut state)
    }

    /// Move the entry at `from` to index `to`.
    pub fn reorder(&self, from: usize, to: usize) -> Result<Persisted<Collection>> {
        let mut state = self.lock();
        state.collection.move_item(from, to)?;
        if from == to {
            return Ok(self.settle(&mut state));
        }
        debug!("Moved collection entry {} -> {}", from, to);
        Ok(self.commit(&mut state))
    }

    /// Empty the collection.
    pub fn clear(&self) -> Persisted<Collection> {
        let mut state = self.lock();
        state.collection.clear();
        info!("Cleared collection '{}'", self.key);
        self.commit(&mut state)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.lock().collection.contains(id)
    }

    pub fn count(&self) -> usize {
        self.lock().collection.len()
    }

    pub fn get(&self, id: u32) -> Option<Pokemon> {
        self.lock().collection.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.lock().collection.ids()
    }

    /// Copy of the current in-memory collection.
    pub fn snapshot(&self) -> Collection {
        self.lock().collection.clone()
    }

    /// Result of an operation that changed nothing. Retries the write if the
    /// durable store is still behind memory.
    fn settle(&self, state: &mut StoreState) -> Persisted<Collection> {
        if state.last_write_error.is_some() {
            return self.commit(state);
        }
        Persisted::clean(state.collection.clone())
    }

    fn commit(&self, state: &mut StoreState) -> Persisted<Collection> {
        let fault = write_collection(self.store.as_ref(), &self.key, &state.collection).err();
        state.last_write_error = fault.as_ref().map(|e| e.to_string());
        Persisted::with_fault(state.collection.clone(), fault)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic mid-operation leaves a valid collection behind.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_collection(store: &dyn KeyValueStore, key: &str) -> Persisted<Collection> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Persisted::clean(Collection::new()),
        Err(e) => {
            warn!("Failed to read collection '{}', starting empty: {}", key, e);
            return Persisted::with_fault(Collection::new(), Some(e));
        }
    };

    match serde_json::from_str::<Collection>(&raw) {
        Ok(collection) => Persisted::clean(collection),
        Err(e) => {
            warn!("Collection '{}' is corrupt, starting empty: {}", key, e);
            Persisted::with_fault(Collection::new(), Some(e.into()))
        }
    }
}

fn write_collection(store: &dyn KeyValueStore, key: &str, collection: &Collection) -> Result<()> {
    let serialized = serde_json::to_string(collection)?;
    store.set(key, &serialized).map_err(|e| {
        warn!(
            "Failed to persist collection '{}', keeping in-memory state: {}",
            key, e
        );
        e
    })
}
