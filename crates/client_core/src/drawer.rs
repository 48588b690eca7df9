//! Random spread selection: distinct cards, independent orientations,
//! positions bound in layout order.

use std::sync::Arc;

use chrono::Utc;
use rand::{seq::SliceRandom, Rng};
use shared::{
    domain::{CardDefinition, DrawId, DrawnCard, DrawnSpread},
    spread::SpreadLayout,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("cannot draw {requested} cards from a deck of {available}")]
    InsufficientCards { requested: usize, available: usize },
}

pub fn draw_cards(
    available: &[Arc<CardDefinition>],
    positions: &[String],
) -> Result<Vec<DrawnCard>, DrawError> {
    draw_cards_with(available, positions, &mut rand::rng())
}

/// Samples `positions.len()` distinct cards without replacement. Position `i`
/// receives the `i`-th card of a partial Fisher-Yates shuffle, and every card
/// gets its own fair coin flip for orientation.
pub fn draw_cards_with<R>(
    available: &[Arc<CardDefinition>],
    positions: &[String],
    rng: &mut R,
) -> Result<Vec<DrawnCard>, DrawError>
where
    R: Rng + ?Sized,
{
    let requested = positions.len();
    if available.len() < requested {
        return Err(DrawError::InsufficientCards {
            requested,
            available: available.len(),
        });
    }

    let mut pool: Vec<&Arc<CardDefinition>> = available.iter().collect();
    let (chosen, _) = pool.partial_shuffle(rng, requested);

    Ok(chosen
        .iter()
        .zip(positions)
        .map(|(card, position)| DrawnCard {
            id: DrawId::new(),
            card: Arc::clone(card),
            is_reversed: rng.random_bool(0.5),
            position: position.clone(),
        })
        .collect())
}

pub fn draw_spread(
    available: &[Arc<CardDefinition>],
    layout: &SpreadLayout,
) -> Result<DrawnSpread, DrawError> {
    draw_spread_with(available, layout, &mut rand::rng())
}

pub fn draw_spread_with<R>(
    available: &[Arc<CardDefinition>],
    layout: &SpreadLayout,
    rng: &mut R,
) -> Result<DrawnSpread, DrawError>
where
    R: Rng + ?Sized,
{
    Ok(DrawnSpread {
        spread_type: layout.spread_type.clone(),
        cards: draw_cards_with(available, &layout.positions, rng)?,
        drawn_at: Utc::now(),
    })
}

#[cfg(test)]
#[path = "tests/drawer_tests.rs"]
mod tests;
