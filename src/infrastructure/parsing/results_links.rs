//! Results-page extraction: decklist detail links out of a standings table.

use std::collections::HashSet;

use anyhow::Result;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use super::compile_selectors;

/// Link strategies in priority order. The standings table is the usual home
/// of deck links, but stripped-down event pages scatter them elsewhere, so
/// the chain ends at any deck-path anchor on the page.
const LINK_SELECTORS: &[&str] = &[
    ".table-condensed tbody tr a[href*='/deck/']",
    "table tr a[href*='/deck/']",
    "a[href*='/deck/']",
];

pub struct ResultsLinkExtractor {
    link_selectors: Vec<Selector>,
}

impl ResultsLinkExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            link_selectors: compile_selectors(LINK_SELECTORS)?,
        })
    }

    /// Absolute decklist URLs from a tournament results page. Duplicates are
    /// removed keeping the first occurrence; order otherwise follows the
    /// page. The first strategy yielding any links wins.
    pub fn extract(&self, html: &str, base_url: &str) -> Vec<String> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(err) => {
                warn!("invalid base url '{}': {}", base_url, err);
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        for selector in &self.link_selectors {
            let links = collect_links(&document, selector, &base);
            if !links.is_empty() {
                return links;
            }
        }
        Vec::new()
    }
}

fn collect_links(document: &Html, selector: &Selector, base: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(err) => {
                warn!("skipping bad deck href '{}': {}", href, err);
                continue;
            }
        };
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}
