//! Crawl binary: harvest tournaments and decklists for the configured
//! formats.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use mtg_meta_crawler::application::IngestionOrchestrator;
use mtg_meta_crawler::infrastructure::{
    init_logging, AppConfig, DatabaseConnection, HttpClient, HttpClientConfig, MetagameRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    let config = AppConfig::from_env().context("configuration error")?;
    info!("Starting crawl for formats: {}", config.formats.join(", "));

    let db = DatabaseConnection::new(&config.database_url).await?;
    db.migrate().await?;
    let repository = MetagameRepository::new(db.pool().clone());

    let fetcher = Arc::new(HttpClient::new(HttpClientConfig {
        timeout_secs: config.request_timeout_secs,
        max_retries: config.max_fetch_retries,
    })?);

    let orchestrator =
        IngestionOrchestrator::new(fetcher, repository.clone(), &config.goldfish_base_url)?;
    orchestrator.run(&config.formats).await?;

    let tournaments = repository.count_tournaments().await?;
    let decklists = repository.count_decklists().await?;
    let card_lines = repository.count_decklist_cards().await?;
    info!(
        "Store now holds {} tournaments, {} decklists, {} card lines",
        tournaments, decklists, card_lines
    );
    Ok(())
}
