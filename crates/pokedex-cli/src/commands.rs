//! Subcommand handlers. Results go to stdout, storage warnings to stderr.

use anyhow::{bail, Result};
use pokedex_core::{Collection, LoadOutcome, Persisted, Pokedex, PokedexError};
use tracing::warn;

pub fn report_load_fault(pokedex: &Pokedex) {
    if let Some(fault) = pokedex.collection().load_fault() {
        eprintln!("warning: saved collection could not be read, starting empty ({})", fault);
    }
}

fn report(result: Persisted<Collection>) -> Collection {
    if let Some(fault) = &result.fault {
        eprintln!("warning: change applied but not saved ({})", fault);
    }
    result.into_value()
}

fn print_collection(collection: &Collection) {
    if collection.is_empty() {
        println!("Collection is empty");
        return;
    }
    for (index, pokemon) in collection.iter().enumerate() {
        println!("{:>3}. {}", index, pokemon);
    }
}

pub async fn discover(pokedex: &Pokedex, pages: u32) -> Result<()> {
    let discovery = pokedex.discovery();

    for _ in 0..pages {
        match discovery.load_more().await {
            Ok(LoadOutcome::Loaded { .. }) => {}
            Ok(LoadOutcome::Exhausted) => break,
            Ok(other) => {
                warn!("Page not loaded: {:?}", other);
                break;
            }
            Err(e) => {
                if discovery.is_empty() {
                    return Err(e.into());
                }
                eprintln!("warning: {}", e);
                break;
            }
        }
    }

    let collection = pokedex.collection();
    for pokemon in discovery.entities() {
        let marker = if collection.contains(pokemon.id) { '*' } else { ' ' };
        println!("{} {}", marker, pokemon);
    }
    if !discovery.has_more() {
        println!("(end of catalog)");
    }
    Ok(())
}

pub fn list(pokedex: &Pokedex) -> Result<()> {
    print_collection(&pokedex.collection().snapshot());
    Ok(())
}

pub async fn add(pokedex: &Pokedex, names: &[String]) -> Result<()> {
    let collection = report(pokedex.collect(names).await?);
    println!("Collection now holds {} pokemon", collection.len());
    Ok(())
}

pub fn remove(pokedex: &Pokedex, id: u32) -> Result<()> {
    if !pokedex.collection().contains(id) {
        println!("Pokemon #{:03} is not in the collection", id);
    }
    let collection = report(pokedex.collection().remove(id));
    print_collection(&collection);
    Ok(())
}

pub fn reorder(pokedex: &Pokedex, from: usize, to: usize) -> Result<()> {
    match pokedex.collection().reorder(from, to) {
        Ok(result) => {
            print_collection(&report(result));
            Ok(())
        }
        Err(PokedexError::InvalidIndex { index, len }) => {
            bail!("position {} is out of range for a collection of {}", index, len)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn clear(pokedex: &Pokedex) -> Result<()> {
    report(pokedex.collection().clear());
    println!("Collection cleared");
    Ok(())
}
