//! Crawl orchestration: formats to tournaments to decklists to card lines.
//!
//! The whole pipeline is sequential by design. Both upstream services are
//! rate-sensitive, and the per-client rate limiters only give a spacing floor
//! when nothing fans out around them. Failures are contained at the level
//! they occur: a bad decklist skips one deck, a bad tournament skips one
//! tournament, a bad listing skips one format.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::services::PageFetcher;
use crate::domain::tournament::TournamentSummary;
use crate::infrastructure::metagame_repository::MetagameRepository;
use crate::infrastructure::parsing::{
    DecklistExtractor, ResultsLinkExtractor, TournamentListExtractor,
};

/// Provenance tag written to every tournament row.
const SOURCE_NAME: &str = "mtggoldfish";

/// Counters for one crawl run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub tournaments: u32,
    pub decklists: u32,
    pub skipped_decklists: u32,
    pub card_lines: u32,
}

pub struct IngestionOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    repository: MetagameRepository,
    base_url: String,
    tournament_list: TournamentListExtractor,
    results_links: ResultsLinkExtractor,
    decklist: DecklistExtractor,
}

impl IngestionOrchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        repository: MetagameRepository,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            repository,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tournament_list: TournamentListExtractor::new()?,
            results_links: ResultsLinkExtractor::new()?,
            decklist: DecklistExtractor::new()?,
        })
    }

    /// Crawl every configured format. Per-format failures are logged and do
    /// not stop the run; the report covers whatever was actually ingested.
    pub async fn run(&self, formats: &[String]) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for format in formats {
            info!("Processing format: {}", format);
            if let Err(err) = self.ingest_format(format, &mut report).await {
                warn!("format '{}' failed: {:#}", format, err);
            }
        }

        info!(
            "Crawl finished: {} tournaments, {} decklists ({} skipped), {} card lines",
            report.tournaments, report.decklists, report.skipped_decklists, report.card_lines
        );
        Ok(report)
    }

    async fn ingest_format(&self, format: &str, report: &mut IngestReport) -> Result<()> {
        let listing_url = format!("{}/tournaments/{}", self.base_url, format);
        let listing_html = self
            .fetcher
            .fetch_page(&listing_url)
            .await
            .with_context(|| format!("fetching listing {listing_url}"))?;

        let summaries = self.tournament_list.extract(&listing_html, &self.base_url);
        info!("Found {} tournaments for {}", summaries.len(), format);

        for summary in &summaries {
            if let Err(err) = self.ingest_tournament(summary, format, report).await {
                warn!(
                    "tournament '{}' ({}) failed: {:#}",
                    summary.name, summary.external_id, err
                );
            }
        }
        Ok(())
    }

    async fn ingest_tournament(
        &self,
        summary: &TournamentSummary,
        format: &str,
        report: &mut IngestReport,
    ) -> Result<()> {
        let tournament_id = self
            .repository
            .upsert_tournament(summary, format, SOURCE_NAME)
            .await
            .context("tournament upsert failed")?;
        report.tournaments += 1;

        let results_html = self
            .fetcher
            .fetch_page(&summary.url)
            .await
            .with_context(|| format!("fetching results page {}", summary.url))?;
        let locators = self.results_links.extract(&results_html, &self.base_url);
        info!(
            "Tournament '{}': {} decklists",
            summary.name,
            locators.len()
        );

        for locator in &locators {
            match self.ingest_decklist(tournament_id, locator).await {
                Ok(line_count) => {
                    report.decklists += 1;
                    report.card_lines += line_count;
                }
                Err(err) => {
                    report.skipped_decklists += 1;
                    warn!("decklist {} skipped: {:#}", locator, err);
                }
            }
        }
        Ok(())
    }

    /// Fetch, extract, and persist one decklist. Card rows are ensured before
    /// line rows so every line always references an existing card.
    async fn ingest_decklist(&self, tournament_id: i64, locator: &str) -> Result<u32> {
        let html = self
            .fetcher
            .fetch_page(locator)
            .await
            .context("fetching decklist page")?;
        let record = self.decklist.extract(&html, locator)?;

        let decklist_id = self
            .repository
            .insert_decklist(tournament_id, &record)
            .await
            .context("decklist insert failed")?;

        let names = record.distinct_card_names();
        self.repository
            .ensure_cards(&names)
            .await
            .context("card create-if-absent failed")?;
        self.repository
            .insert_decklist_cards(decklist_id, &record.cards)
            .await
            .context("card line insert failed")?;

        Ok(record.cards.len() as u32)
    }
}
