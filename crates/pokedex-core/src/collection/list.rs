//! The ordered, deduplicated collection value.

use crate::models::Pokemon;
use crate::{PokedexError, Result};
use serde::{Deserialize, Serialize};

/// User-ordered sequence of Pokemon with no two entries sharing an id.
///
/// Serializes as a plain JSON array of entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Collection {
    items: Vec<Pokemon>,
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let items = Vec::<Pokemon>::deserialize(deserializer)?;
        Ok(Self::from_entities(items))
    }
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entities, keeping the first occurrence of each id.
    pub fn from_entities(entities: impl IntoIterator<Item = Pokemon>) -> Self {
        let mut collection = Self::new();
        for entity in entities {
            collection.insert(entity);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pokemon> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Pokemon] {
        &self.items
    }

    pub fn ids(&self) -> Vec<u32> {
        self.items.iter().map(|p| p.id).collect()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: u32) -> Option<usize> {
        self.items.iter().position(|p| p.id == id)
    }

    pub fn get(&self, id: u32) -> Option<&Pokemon> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Append unless the id is already present. Returns whether it was added.
    pub(crate) fn insert(&mut self, entity: Pokemon) -> bool {
        if self.contains(entity.id) {
            return false;
        }
        self.items.push(entity);
        true
    }

    /// Remove the entry with `id`. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id != id);
        self.items.len() != before
    }

    /// Move the element at `from` so that it ends up at index `to`.
    pub(crate) fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(PokedexError::InvalidIndex { index, len });
            }
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Pokemon;
    type IntoIter = std::slice::Iter<'a, Pokemon>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Collection> for Vec<Pokemon> {
    fn from(collection: Collection) -> Self {
        collection.items
    }
}
