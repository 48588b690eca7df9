use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadKind {
    Daily,
    ThreeCard,
    FourCard,
}

impl SpreadKind {
    pub const ALL: [SpreadKind; 3] = [
        SpreadKind::Daily,
        SpreadKind::ThreeCard,
        SpreadKind::FourCard,
    ];

    /// Tag sent as `spread_type` on the wire.
    pub fn spread_type(&self) -> &'static str {
        match self {
            SpreadKind::Daily => "daily",
            SpreadKind::ThreeCard => "three_card",
            SpreadKind::FourCard => "four_card",
        }
    }

    pub fn positions(&self) -> &'static [&'static str] {
        match self {
            SpreadKind::Daily => &["Today"],
            SpreadKind::ThreeCard => &["Past", "Present", "Future"],
            SpreadKind::FourCard => &["Situation", "Challenge", "Advice", "Outcome"],
        }
    }

    pub fn layout(&self) -> SpreadLayout {
        SpreadLayout::new(self.spread_type(), self.positions().iter().copied())
    }
}

impl fmt::Display for SpreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spread_type())
    }
}

impl FromStr for SpreadKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "daily" | "single" | "one" => Ok(SpreadKind::Daily),
            "three" | "three_card" => Ok(SpreadKind::ThreeCard),
            "four" | "four_card" => Ok(SpreadKind::FourCard),
            _ => Err(DomainError::UnknownSpread(value.to_string())),
        }
    }
}

/// Draw input: the wire tag plus the ordered position labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadLayout {
    pub spread_type: String,
    pub positions: Vec<String>,
}

impl SpreadLayout {
    pub fn new<I, S>(spread_type: impl Into<String>, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            spread_type: spread_type.into(),
            positions: positions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl From<SpreadKind> for SpreadLayout {
    fn from(kind: SpreadKind) -> Self {
        kind.layout()
    }
}

#[cfg(test)]
#[path = "tests/spread_tests.rs"]
mod tests;
