use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(CardId);
id_newtype!(DrawId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Wands,
    Cups,
    Swords,
    Pentacles,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Wands, Suit::Cups, Suit::Swords, Suit::Pentacles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Suit::Wands => "Wands",
            Suit::Cups => "Cups",
            Suit::Swords => "Swords",
            Suit::Pentacles => "Pentacles",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suit {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Suit::ALL
            .into_iter()
            .find(|suit| suit.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| DomainError::UnknownSuit(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arcana {
    Major,
    Minor,
}

impl Arcana {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arcana::Major => "Major",
            Arcana::Minor => "Minor",
        }
    }
}

impl fmt::Display for Arcana {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arcana {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Arcana::Major),
            "minor" => Ok(Arcana::Minor),
            _ => Err(DomainError::UnknownArcana(value.to_string())),
        }
    }
}

/// A card as the store holds it. Deck files may omit `id`; a fresh one is
/// minted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    #[serde(default)]
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub suit: Option<Suit>,
    #[serde(default)]
    pub number: Option<i32>,
    pub upright_meaning: String,
    pub reversed_meaning: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub arcana: Option<Arcana>,
}

impl CardDefinition {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyField {
                card: self.id,
                field: "name",
            });
        }
        if self.upright_meaning.trim().is_empty() {
            return Err(DomainError::EmptyField {
                card: self.id,
                field: "upright_meaning",
            });
        }
        if self.reversed_meaning.trim().is_empty() {
            return Err(DomainError::EmptyField {
                card: self.id,
                field: "reversed_meaning",
            });
        }
        Ok(())
    }
}

/// One card placed in a spread. Shares the definition read-only; a new draw
/// replaces the whole set rather than editing entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnCard {
    pub id: DrawId,
    pub card: Arc<CardDefinition>,
    pub is_reversed: bool,
    pub position: String,
}

impl DrawnCard {
    pub fn orientation_label(&self) -> &'static str {
        orientation_label(self.is_reversed)
    }

    pub fn meaning(&self) -> &str {
        if self.is_reversed {
            &self.card.reversed_meaning
        } else {
            &self.card.upright_meaning
        }
    }
}

/// Immutable snapshot of one draw, captured before the interpretation request
/// leaves so that later draws cannot alter an in-flight payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnSpread {
    pub spread_type: String,
    pub cards: Vec<DrawnCard>,
    pub drawn_at: DateTime<Utc>,
}

pub fn orientation_label(is_reversed: bool) -> &'static str {
    if is_reversed {
        "Reversed"
    } else {
        "Upright"
    }
}
