use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card attributes as returned by the reference card database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub name: String,
    /// Empty string when the card has no printed cost (e.g. lands).
    pub mana_cost: String,
    pub cmc: f64,
    pub type_line: String,
    pub scryfall_uri: String,
    pub is_land: bool,
}

impl CardMetadata {
    pub fn new(
        name: String,
        mana_cost: String,
        cmc: f64,
        type_line: String,
        scryfall_uri: String,
    ) -> Self {
        let is_land = is_land_type(&type_line);
        Self {
            name,
            mana_cost,
            cmc,
            type_line,
            scryfall_uri,
            is_land,
        }
    }
}

/// Whether a type line denotes a land. Case-insensitive containment, so
/// "Basic Land — Island" and "Artifact Land" both qualify.
pub fn is_land_type(type_line: &str) -> bool {
    type_line.to_lowercase().contains("land")
}

/// A card row as read back from the store. Metadata columns stay NULL until
/// the enrichment job fills them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCard {
    pub name: String,
    pub mana_cost: Option<String>,
    pub cmc: Option<f64>,
    pub type_line: Option<String>,
    pub is_land: Option<bool>,
    pub scryfall_uri: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredCard {
    /// A row is pending enrichment while either core attribute is missing.
    pub fn needs_enrichment(&self) -> bool {
        self.cmc.is_none() || self.type_line.is_none()
    }
}
