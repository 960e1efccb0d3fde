mod builder;

pub use builder::PokedexBuilder;
