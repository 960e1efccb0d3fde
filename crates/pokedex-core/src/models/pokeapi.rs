//! Raw PokeAPI response shapes and their normalization into [`Pokemon`].

use super::pokemon::{Pokemon, PokemonStats, PokemonType, PLACEHOLDER_IMAGE};
use crate::{PokedexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Colour used for types missing from the palette.
pub const UNKNOWN_TYPE_COLOR: &str = "#777777";

const TYPE_COLORS: &[(&str, &str)] = &[
    ("normal", "#A8A878"),
    ("fire", "#F08030"),
    ("water", "#6890F0"),
    ("electric", "#F8D030"),
    ("grass", "#78C850"),
    ("ice", "#98D8D8"),
    ("fighting", "#C03028"),
    ("poison", "#A040A0"),
    ("ground", "#E0C068"),
    ("flying", "#A890F0"),
    ("psychic", "#F85888"),
    ("bug", "#A8B820"),
    ("rock", "#B8A038"),
    ("ghost", "#705898"),
    ("dragon", "#7038F8"),
    ("dark", "#705848"),
    ("steel", "#B8B8D0"),
    ("fairy", "#EE99AC"),
];

/// Display colour for an upstream (lower-case) type name.
pub fn type_color(name: &str) -> &'static str {
    TYPE_COLORS
        .iter()
        .find(|(type_name, _)| *type_name == name)
        .map(|(_, color)| *color)
        .unwrap_or(UNKNOWN_TYPE_COLOR)
}

/// `GET /pokemon?offset=&limit=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub count: u32,
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

/// A `{name, url}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// `GET /pokemon/{nameOrId}`, reduced to the fields the entity needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonResponse {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: HashMap<String, Artwork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    pub stat: NamedResource,
}

impl PokemonResponse {
    fn base_stat(&self, name: &str) -> u32 {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
            .unwrap_or(0)
    }

    fn image(&self) -> String {
        self.sprites
            .other
            .get("official-artwork")
            .and_then(|a| a.front_default.clone())
            .filter(|url| !url.is_empty())
            .or_else(|| self.sprites.front_default.clone())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
    }

    /// Normalize into the entity model, rejecting responses without an identity.
    pub fn into_pokemon(self) -> Result<Pokemon> {
        if self.id == 0 {
            return Err(PokedexError::Validation {
                field: "id".to_string(),
                message: format!("{} has no positive id", self.name),
            });
        }
        if self.name.trim().is_empty() {
            return Err(PokedexError::Validation {
                field: "name".to_string(),
                message: format!("pokemon {} has an empty name", self.id),
            });
        }

        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|s| s.slot);
        let types = slots
            .into_iter()
            .map(|s| PokemonType {
                name: s.kind.name.to_uppercase(),
                color: type_color(&s.kind.name).to_string(),
            })
            .collect();

        let stats = PokemonStats {
            hp: self.base_stat("hp"),
            attack: self.base_stat("attack"),
            defense: self.base_stat("defense"),
            special_attack: self.base_stat("special-attack"),
            special_defense: self.base_stat("special-defense"),
            speed: self.base_stat("speed"),
        };

        Ok(Pokemon {
            id: self.id,
            name: capitalize(&self.name),
            image: self.image(),
            types,
            stats,
        })
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
