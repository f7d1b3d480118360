//! Enrichment binary: fill in metadata for cards the crawl left bare.
//!
//! Meant to run after a crawl, or on a schedule; each run handles one batch
//! and leaves the rest for the next.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use mtg_meta_crawler::application::EnrichmentJob;
use mtg_meta_crawler::infrastructure::{
    init_logging, AppConfig, DatabaseConnection, MetagameRepository, ScryfallClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    let config = AppConfig::from_env().context("configuration error")?;

    let db = DatabaseConnection::new(&config.database_url).await?;
    db.migrate().await?;
    let repository = MetagameRepository::new(db.pool().clone());

    let provider = Arc::new(ScryfallClient::new(
        &config.scryfall_base_url,
        config.request_timeout_secs,
    )?);

    let job = EnrichmentJob::new(provider, repository, config.enrich_batch_limit);
    let report = job.run().await?;

    info!(
        "Done: {} of {} pending cards enriched, {} missed",
        report.enriched, report.pending, report.missed
    );
    Ok(())
}
