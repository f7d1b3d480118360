//! Service seams between orchestration and the network.
//!
//! Trait objects let the ingestion and enrichment logic run against stub
//! implementations in tests; the real implementations live in the
//! infrastructure layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::card::CardMetadata;

/// Performs a single outbound request and returns the raw markup.
/// All crawl network I/O funnels through this seam.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Looks up card attributes by exact name against the reference service.
#[async_trait]
pub trait CardMetadataProvider: Send + Sync {
    /// Exact-name lookup. `Ok(None)` means the service knows no such card,
    /// which is a normal outcome and distinct from a transport error.
    async fn lookup_one(&self, name: &str) -> Result<Option<CardMetadata>>;

    /// Bulk lookup. Returned records carry no order guarantee; consumers key
    /// by name. Implementations drop a failed batch's contribution rather
    /// than aborting the remaining batches.
    async fn lookup_bulk(&self, names: &[String]) -> Result<Vec<CardMetadata>>;
}
