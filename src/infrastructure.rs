//! Infrastructure layer: network clients, markup extraction, and persistence.
//!
//! Everything here implements a seam the domain or application layer defines.
//! The HTTP client and the metadata client own their own rate limiting; the
//! parsing module owns the selector strategy chains for the results site.

pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod metagame_repository;
pub mod parsing;
pub mod retry;
pub mod scryfall;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError};
pub use database_connection::DatabaseConnection;
pub use http_client::{FetchError, HttpClient, HttpClientConfig};
pub use logging::init_logging;
pub use metagame_repository::MetagameRepository;
pub use parsing::{
    DecklistExtractor, ParseError, ParseResult, ResultsLinkExtractor, TournamentListExtractor,
};
pub use retry::RetryPolicy;
pub use scryfall::{ScryfallClient, MAX_COLLECTION_BATCH};
