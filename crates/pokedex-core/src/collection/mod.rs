//! The user's curated, ordered and persisted collection.

mod list;
mod store;

pub use list::Collection;
pub use store::{CollectionStore, Persisted};
