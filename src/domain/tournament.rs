use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One tournament as seen on a format's listing page.
///
/// `external_id` is the results site's own identifier (the last path segment
/// of `url`) and is the deduplication key across crawl runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub external_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub url: String,
}

/// A tournament row as persisted, including its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTournament {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub format: String,
    pub url: String,
    pub source: String,
}

/// One player's deck as extracted from a decklist detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecklistRecord {
    pub url: String,
    pub player_name: String,
    /// Placement within the tournament, 0 when the page does not show one.
    pub rank: u32,
    pub deck_name: String,
    pub cards: Vec<CardLine>,
}

/// A single `(quantity, card name)` row of a decklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLine {
    pub name: String,
    /// Always positive; rows that fail to parse a quantity are discarded
    /// upstream and never reach persistence.
    pub quantity: u32,
    pub is_sideboard: bool,
}

impl DecklistRecord {
    /// Distinct card names in first-appearance order, mainboard and sideboard
    /// together. Used to ensure card rows exist before line rows are written.
    pub fn distinct_card_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.cards
            .iter()
            .filter(|line| seen.insert(line.name.as_str()))
            .map(|line| line.name.as_str())
            .collect()
    }
}
