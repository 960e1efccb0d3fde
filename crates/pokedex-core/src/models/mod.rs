//! Data models.
//!
//! [`Pokemon`] is the normalized entity shared by the collection store and
//! the discovery cache; the `pokeapi` module holds the upstream response
//! shapes and their conversion.

mod pokeapi;
mod pokemon;

pub use pokeapi::*;
pub use pokemon::*;
