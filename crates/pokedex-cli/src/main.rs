//! Pokedex CLI - browse the PokeAPI catalog and manage a local collection.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pokedex_core::Pokedex;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Browse Pokemon and curate a personal collection")]
struct Args {
    /// Directory holding the saved collection (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pokemon fetched per discovery page
    #[arg(long, global = true, default_value = "6")]
    page_size: u32,

    /// Catalog API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Page through the catalog
    Discover {
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Inspect or edit the saved collection
    #[command(subcommand)]
    Collection(CollectionCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum CollectionCommand {
    /// Show the collection in order
    List,
    /// Look pokemon up by name or id and add them
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove a pokemon by id
    Remove { id: u32 },
    /// Move the pokemon at one position to another (0-based)
    Move { from: usize, to: usize },
    /// Remove every pokemon
    Clear,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_pokedex(args: &Args) -> Result<Pokedex> {
    let mut builder = Pokedex::builder().page_size(args.page_size);
    if let Some(dir) = &args.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(url) = &args.base_url {
        builder = builder.base_url(url);
    }
    Ok(builder.build()?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    debug!("{:?}", args);

    let pokedex = build_pokedex(&args)?;
    commands::report_load_fault(&pokedex);

    match args.command {
        Command::Discover { pages } => commands::discover(&pokedex, pages).await,
        Command::Collection(CollectionCommand::List) => commands::list(&pokedex),
        Command::Collection(CollectionCommand::Add { names }) => {
            commands::add(&pokedex, &names).await
        }
        Command::Collection(CollectionCommand::Remove { id }) => commands::remove(&pokedex, id),
        Command::Collection(CollectionCommand::Move { from, to }) => {
            commands::reorder(&pokedex, from, to)
        }
        Command::Collection(CollectionCommand::Clear) => commands::clear(&pokedex),
    }
}
