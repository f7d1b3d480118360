//! Tournament metagame crawler.
//!
//! Harvests competitive tournament results from MTGGoldfish (tournaments,
//! decklists, card lines), persists them idempotently into SQLite, and
//! enriches the harvested card names with Scryfall metadata in a separate
//! pass.
//!
//! Layering follows the usual three rings: `domain` holds the records and
//! service seams, `application` the crawl and enrichment pipelines,
//! `infrastructure` the HTTP clients, extractors, and the repository.

pub mod application;
pub mod domain;
pub mod infrastructure;
