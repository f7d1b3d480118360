//! Card metadata enrichment: fill in rows the crawl created bare.
//!
//! One run handles at most a configured batch of pending cards. Names the
//! metadata service does not recognize simply stay pending and come up again
//! on the next run; there is no retry within a run.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::services::CardMetadataProvider;
use crate::infrastructure::metagame_repository::MetagameRepository;

/// Counters for one enrichment run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    /// Cards that were pending at the start of the run (capped at the batch
    /// limit).
    pub pending: usize,
    /// Rows actually updated this run.
    pub enriched: usize,
    /// Pending cards that got no usable metadata; retried next run.
    pub missed: usize,
}

pub struct EnrichmentJob {
    provider: Arc<dyn CardMetadataProvider>,
    repository: MetagameRepository,
    batch_limit: u32,
}

impl EnrichmentJob {
    pub fn new(
        provider: Arc<dyn CardMetadataProvider>,
        repository: MetagameRepository,
        batch_limit: u32,
    ) -> Self {
        Self {
            provider,
            repository,
            batch_limit,
        }
    }

    pub async fn run(&self) -> Result<EnrichReport> {
        let names = self
            .repository
            .card_names_missing_metadata(self.batch_limit)
            .await?;
        if names.is_empty() {
            info!("No cards pending enrichment");
            return Ok(EnrichReport::default());
        }

        info!("Enriching {} cards", names.len());
        let records = self.provider.lookup_bulk(&names).await?;

        let now = Utc::now();
        let mut enriched = 0usize;
        for metadata in &records {
            match self.repository.apply_card_metadata(metadata, now).await {
                Ok(true) => {
                    enriched += 1;
                    debug!("Enriched: {}", metadata.name);
                }
                Ok(false) => debug!("'{}' was already enriched; left as is", metadata.name),
                Err(err) => warn!("updating '{}' failed: {:#}", metadata.name, err),
            }
        }

        let missed = names.len().saturating_sub(enriched);
        info!(
            "Enrichment finished: {}/{} updated, {} left for the next run",
            enriched,
            names.len(),
            missed
        );
        Ok(EnrichReport {
            pending: names.len(),
            enriched,
            missed,
        })
    }
}
