//! Domain module - core entities and service seams
//!
//! Contains the structured records the crawl produces (tournament summaries,
//! decklists, card lines), the card metadata model, and the async traits that
//! isolate network I/O from orchestration logic.

pub mod card;
pub mod services;
pub mod tournament;

// Re-export commonly used items for convenience
pub use card::{CardMetadata, StoredCard};
pub use services::{CardMetadataProvider, PageFetcher};
pub use tournament::{CardLine, DecklistRecord, StoredTournament, TournamentSummary};
