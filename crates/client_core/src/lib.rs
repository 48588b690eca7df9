//! Client side of the tarot reader: spread drawing, the interpretation
//! service client, and the request sequencer that ties them together.

use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::CardDefinition;
use storage::CardStore;

pub mod drawer;
pub mod interpretation;
pub mod sequencer;

pub use drawer::{draw_cards, draw_cards_with, draw_spread, draw_spread_with, DrawError};
pub use interpretation::{
    interpret_endpoint, ClientConfigError, InterpretationClient, InterpretationError,
    Interpreter, DEFAULT_API_URL,
};
pub use sequencer::{InterpretationStatus, RequestId, RequestSequencer, SequencerSnapshot};

/// Reads the store's cards into the shared form the drawer samples from.
pub async fn load_deck(store: &dyn CardStore) -> Result<Vec<Arc<CardDefinition>>> {
    let cards = store
        .all_cards()
        .await
        .context("failed to load cards from store")?;
    Ok(cards.into_iter().map(Arc::new).collect())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
