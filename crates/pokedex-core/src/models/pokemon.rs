//! The normalized catalog entity.

use serde::{Deserialize, Serialize};

/// Image shown when the catalog has no artwork for an entity.
pub const PLACEHOLDER_IMAGE: &str = "/pokemon-placeholder.png";

/// A Pokemon as the rest of the system sees it, independent of the
/// upstream response shape.
///
/// `id` is the catalog key: two values with the same id are the same item,
/// whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default = "placeholder_image")]
    pub image: String,
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub stats: PokemonStats,
}

/// A type tag with its display colour. Order within an entity is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonType {
    pub name: String,
    pub color: String,
}

/// Base stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PokemonStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
}

impl Pokemon {
    /// Upper-cased type names joined for display, e.g. `GRASS/POISON`.
    pub fn type_label(&self) -> String {
        self.types
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for Pokemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:03} {} [{}]", self.id, self.name, self.type_label())
    }
}

fn placeholder_image() -> String {
    PLACEHOLDER_IMAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_stats() {
        let stats = PokemonStats {
            special_attack: 65,
            special_defense: 65,
            ..Default::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["specialAttack"], 65);
        assert_eq!(json["specialDefense"], 65);
    }

    #[test]
    fn test_missing_image_and_stats_default() {
        let json = r##"{"id":25,"name":"Pikachu","types":[{"name":"ELECTRIC","color":"#F8D030"}]}"##;
        let pokemon: Pokemon = serde_json::from_str(json).unwrap();
        assert_eq!(pokemon.image, PLACEHOLDER_IMAGE);
        assert_eq!(pokemon.stats, PokemonStats::default());
    }

    #[test]
    fn test_display() {
        let pokemon = Pokemon {
            id: 1,
            name: "Bulbasaur".into(),
            image: PLACEHOLDER_IMAGE.into(),
            types: vec![
                PokemonType {
                    name: "GRASS".into(),
                    color: "#78C850".into(),
                },
                PokemonType {
                    name: "POISON".into(),
                    color: "#A040A0".into(),
                },
            ],
            stats: PokemonStats::default(),
        };
        assert_eq!(pokemon.to_string(), "#001 Bulbasaur [GRASS/POISON]");
    }
}
