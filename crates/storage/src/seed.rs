//! The bundled Rider-Waite-Smith deck and helpers for loading deck files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use shared::domain::CardDefinition;
use tracing::info;

use crate::CardStore;

const STANDARD_DECK_JSON: &str = include_str!("../data/standard_deck.json");

/// The 78-card standard deck. Ids are minted fresh on every call.
pub fn standard_deck() -> Result<Vec<CardDefinition>> {
    parse_deck(STANDARD_DECK_JSON).context("bundled deck data is malformed")
}

/// Parses a JSON array of card records, rejecting cards with empty text fields.
pub fn parse_deck(raw: &str) -> Result<Vec<CardDefinition>> {
    let cards: Vec<CardDefinition> = serde_json::from_str(raw)?;
    for card in &cards {
        card.validate()?;
    }
    Ok(cards)
}

pub fn load_deck_file(path: &Path) -> Result<Vec<CardDefinition>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read deck file '{}'", path.display()))?;
    parse_deck(&raw).with_context(|| format!("failed to parse deck file '{}'", path.display()))
}

pub async fn import_cards(store: &dyn CardStore, cards: Vec<CardDefinition>) -> Result<usize> {
    for card in cards {
        store.insert(card).await?;
    }
    store.persist().await
}

/// Seeds the standard deck into an empty store. Returns 0 when the store
/// already holds cards.
pub async fn seed_if_empty(store: &dyn CardStore) -> Result<usize> {
    if !store.is_empty().await? {
        return Ok(0);
    }

    let written = import_cards(store, standard_deck()?).await?;
    info!(card_count = written, "seeded standard deck");
    Ok(written)
}
