use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::{import_cards, load_deck_file, seed_if_empty, CardStore, Storage};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/tarot.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the bundled 78-card deck into an empty store.
    Seed,
    /// Append cards from a JSON deck file.
    Import { path: PathBuf },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => {
            let written = seed_if_empty(&storage).await?;
            if written == 0 {
                let existing = storage.card_count().await?;
                println!("store already holds {existing} cards; nothing seeded");
            } else {
                println!("seeded {written} cards");
            }
        }
        Command::Import { path } => {
            let cards = load_deck_file(&path)?;
            let written = import_cards(&storage, cards).await?;
            println!("imported {written} cards from {}", path.display());
        }
        Command::List => {
            for card in storage.all_cards().await? {
                println!("{}\t{}", card.id, card.name);
            }
        }
    }

    Ok(())
}
