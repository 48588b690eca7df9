use serde::{Deserialize, Serialize};

use crate::domain::{orientation_label, DrawnCard, DrawnSpread};

/// One card as sent to `POST /interpret_spread`. Both meanings are always
/// sent; the backend picks the one matching `is_reversed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayload {
    pub name: String,
    pub position: String,
    pub is_reversed: bool,
    pub upright_meaning: String,
    pub reversed_meaning: String,
    #[serde(default)]
    pub suit: Option<String>,
    #[serde(default)]
    pub arcana: Option<String>,
}

impl CardPayload {
    pub fn from_drawn(drawn: &DrawnCard) -> Self {
        Self {
            name: drawn.card.name.clone(),
            position: drawn.position.clone(),
            is_reversed: drawn.is_reversed,
            upright_meaning: drawn.card.upright_meaning.clone(),
            reversed_meaning: drawn.card.reversed_meaning.clone(),
            suit: drawn.card.suit.map(|suit| suit.to_string()),
            arcana: drawn.card.arcana.map(|arcana| arcana.to_string()),
        }
    }

    pub fn orientation_label(&self) -> &'static str {
        orientation_label(self.is_reversed)
    }

    pub fn meaning(&self) -> &str {
        if self.is_reversed {
            &self.reversed_meaning
        } else {
            &self.upright_meaning
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadRequest {
    pub spread_type: String,
    pub cards: Vec<CardPayload>,
}

impl SpreadRequest {
    pub fn from_drawn(spread_type: impl Into<String>, cards: &[DrawnCard]) -> Self {
        Self {
            spread_type: spread_type.into(),
            cards: cards.iter().map(CardPayload::from_drawn).collect(),
        }
    }

    pub fn from_spread(spread: &DrawnSpread) -> Self {
        Self::from_drawn(spread.spread_type.clone(), &spread.cards)
    }

    /// Single-card spreads are read as a daily card whatever their tag.
    pub fn is_daily(&self) -> bool {
        self.spread_type == "daily" || self.cards.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadResponse {
    pub interpretation: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
