mod config;

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{load_deck, InterpretationClient, InterpretationStatus, RequestSequencer};
use shared::{
    domain::{CardDefinition, DrawnCard, DrawnSpread},
    spread::SpreadKind,
};
use storage::{seed_if_empty, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Draw tarot spreads and ask the reading service to interpret them")]
struct Cli {
    /// Base url of the interpretation service.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    /// Transport timeout in seconds; 0 disables it.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw a spread and print its interpretation.
    Draw {
        #[arg(long, default_value = "three")]
        spread: SpreadKind,
    },
    /// List the cards in the local deck.
    Cards,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = config::load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = (secs > 0).then_some(secs);
    }

    let database_url = config::normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await?;
    let seeded = seed_if_empty(&storage).await?;
    if seeded > 0 {
        info!(card_count = seeded, database_url = %database_url, "seeded empty deck");
    }
    let deck = load_deck(&storage).await?;

    match cli.command {
        Command::Cards => {
            for card in &deck {
                println!("{}", deck_line(card));
            }
        }
        Command::Draw { spread } => {
            let client = match settings.request_timeout_secs {
                Some(secs) => InterpretationClient::with_timeout(
                    &settings.api_url,
                    Duration::from_secs(secs),
                )?,
                None => InterpretationClient::new(&settings.api_url)?,
            };
            info!(endpoint = %client.endpoint(), spread = %spread, "drawing spread");

            let sequencer = RequestSequencer::new(Arc::new(client));
            let request_id = sequencer
                .draw(&deck, &spread.layout())
                .with_context(|| format!("cannot draw a {spread} spread"))?;

            if let Some(drawn) = sequencer.snapshot().spread {
                println!("{}", spread_header(&drawn));
                for card in &drawn.cards {
                    println!("{}", card_line(card));
                }
            }
            println!();
            println!("Consulting the cards...");

            match sequencer.settled(request_id).await.status {
                InterpretationStatus::Succeeded { text, .. } => {
                    println!();
                    println!("{text}");
                }
                InterpretationStatus::Failed { error, .. } => {
                    bail!("interpretation failed: {error}");
                }
                other => bail!("request {request_id} ended in unexpected state {other:?}"),
            }
        }
    }

    Ok(())
}

fn spread_header(spread: &DrawnSpread) -> String {
    format!(
        "{} spread, drawn {}",
        spread.spread_type,
        spread.drawn_at.format("%Y-%m-%d %H:%M UTC")
    )
}

fn card_line(card: &DrawnCard) -> String {
    format!(
        "{:<10} {} ({}): {}",
        card.position,
        card.card.name,
        card.orientation_label(),
        card.meaning()
    )
}

fn deck_line(card: &CardDefinition) -> String {
    let group = match (card.arcana, card.suit) {
        (_, Some(suit)) => suit.to_string(),
        (Some(arcana), None) => format!("{arcana} Arcana"),
        (None, None) => "-".to_string(),
    };
    format!("{:<22} {group}", card.name)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
