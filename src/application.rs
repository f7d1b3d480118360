//! Application layer: the crawl and enrichment pipelines.
//!
//! Orchestration lives here; the layer talks to the network only through the
//! domain service seams and to the store only through the repository.

pub mod enrichment;
pub mod ingestion;

pub use enrichment::{EnrichReport, EnrichmentJob};
pub use ingestion::{IngestReport, IngestionOrchestrator};
