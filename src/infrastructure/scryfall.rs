//! Card metadata client for the Scryfall API.
//!
//! Both lookup paths sit behind a shared rate limiter so calls toward the
//! service keep a fixed spacing floor regardless of which operation issues
//! them. Bulk lookups are partitioned into collection-sized batches; a failed
//! batch drops its contribution and the rest proceed.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::card::CardMetadata;
use crate::domain::services::CardMetadataProvider;

/// Hard ceiling the collection endpoint puts on identifiers per request.
pub const MAX_COLLECTION_BATCH: usize = 75;

/// Spacing floor between outbound calls, per the service's rate guidance.
const CALL_INTERVAL: Duration = Duration::from_millis(100);

/// Wire shape of a card record; everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
struct ScryfallCard {
    name: String,
    #[serde(default)]
    mana_cost: Option<String>,
    cmc: f64,
    type_line: String,
    scryfall_uri: String,
}

impl From<ScryfallCard> for CardMetadata {
    fn from(card: ScryfallCard) -> Self {
        CardMetadata::new(
            card.name,
            card.mana_cost.unwrap_or_default(),
            card.cmc,
            card.type_line,
            card.scryfall_uri,
        )
    }
}

#[derive(Debug, Serialize)]
struct CollectionRequest {
    identifiers: Vec<NameIdentifier>,
}

#[derive(Debug, Serialize)]
struct NameIdentifier {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

pub struct ScryfallClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl ScryfallClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build metadata HTTP client")?;

        let quota = Quota::with_period(CALL_INTERVAL)
            .context("call interval must be non-zero")?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    async fn fetch_named(&self, name: &str) -> Result<Option<CardMetadata>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/cards/named", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("exact", name)])
            .send()
            .await
            .with_context(|| format!("exact lookup request failed for '{name}'"))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("no card named '{}'", name);
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!(
                "exact lookup for '{}' returned status {}",
                name,
                response.status()
            );
        }

        let card: ScryfallCard = response
            .json()
            .await
            .with_context(|| format!("exact lookup response for '{name}' was not a card"))?;
        Ok(Some(card.into()))
    }

    async fn fetch_collection(&self, names: &[String]) -> Result<Vec<CardMetadata>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/cards/collection", self.base_url);
        let request = CollectionRequest {
            identifiers: names
                .iter()
                .map(|name| NameIdentifier { name: name.clone() })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("collection request failed")?;
        if !response.status().is_success() {
            bail!("collection request returned status {}", response.status());
        }

        let body: CollectionResponse = response
            .json()
            .await
            .context("collection response was not valid JSON")?;

        // A single malformed record must not poison its whole batch.
        let mut cards = Vec::with_capacity(body.data.len());
        for value in body.data {
            match serde_json::from_value::<ScryfallCard>(value) {
                Ok(card) => cards.push(card.into()),
                Err(err) => warn!("skipping malformed card record: {}", err),
            }
        }
        Ok(cards)
    }
}

#[async_trait]
impl CardMetadataProvider for ScryfallClient {
    async fn lookup_one(&self, name: &str) -> Result<Option<CardMetadata>> {
        self.fetch_named(name).await
    }

    async fn lookup_bulk(&self, names: &[String]) -> Result<Vec<CardMetadata>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "Looking up {} cards in {} collection calls",
            names.len(),
            batch_count(names.len())
        );

        let mut merged = Vec::with_capacity(names.len());
        for batch in names.chunks(MAX_COLLECTION_BATCH) {
            match self.fetch_collection(batch).await {
                Ok(cards) => merged.extend(cards),
                Err(err) => warn!("dropping a batch of {} names: {:#}", batch.len(), err),
            }
        }
        Ok(merged)
    }
}

/// Number of collection calls a bulk lookup of `total` names will issue.
pub fn batch_count(total: usize) -> usize {
    total.div_ceil(MAX_COLLECTION_BATCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn batch_count_matches_the_ceiling() {
        assert_eq!(batch_count(0), 0);
        assert_eq!(batch_count(1), 1);
        assert_eq!(batch_count(75), 1);
        assert_eq!(batch_count(76), 2);
        assert_eq!(batch_count(150), 2);
        assert_eq!(batch_count(151), 3);
    }

    #[test]
    fn collection_records_decode_tolerantly() {
        let payload = serde_json::json!({
            "data": [
                {
                    "name": "Lightning Bolt",
                    "mana_cost": "{R}",
                    "cmc": 1.0,
                    "type_line": "Instant",
                    "scryfall_uri": "https://scryfall.test/card/lightning-bolt",
                    "set": "lea"
                },
                { "object": "error", "details": "mangled" }
            ]
        });

        let response: CollectionResponse = serde_json::from_value(payload).unwrap();
        let decoded: Vec<ScryfallCard> = response
            .data
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].name, "Lightning Bolt");
        assert_eq!(decoded[0].mana_cost.as_deref(), Some("{R}"));
    }

    #[test]
    fn missing_mana_cost_becomes_empty_string() {
        let card: ScryfallCard = serde_json::from_value(serde_json::json!({
            "name": "Forest",
            "cmc": 0.0,
            "type_line": "Basic Land — Forest",
            "scryfall_uri": "https://scryfall.test/card/forest"
        }))
        .unwrap();

        let metadata = CardMetadata::from(card);
        assert_eq!(metadata.mana_cost, "");
        assert!(metadata.is_land);
    }

    proptest! {
        #[test]
        fn batching_covers_every_name_exactly_once(total in 0usize..600) {
            let names: Vec<String> = (0..total).map(|i| format!("card-{i}")).collect();
            let batches: Vec<&[String]> = names.chunks(MAX_COLLECTION_BATCH).collect();

            prop_assert_eq!(batches.len(), batch_count(total));
            for batch in &batches {
                prop_assert!(batch.len() <= MAX_COLLECTION_BATCH);
            }
            let rejoined: Vec<String> = batches.concat();
            prop_assert_eq!(rejoined, names);
        }
    }
}
