//! HTML extraction for the tournament results site.
//!
//! The site's markup is semi-structured and has shifted across redesigns, so
//! every extractor works through an ordered chain of selector strategies: the
//! first strategy that yields results wins, and later chain entries cover
//! older or stripped-down page variants. Invalid selectors are tolerated at
//! construction (skipped with a warning) so one bad entry never disables a
//! whole extractor.

pub mod decklist;
pub mod error;
pub mod results_links;
pub mod tournament_list;

pub use decklist::DecklistExtractor;
pub use error::{ParseError, ParseResult};
pub use results_links::ResultsLinkExtractor;
pub use tournament_list::TournamentListExtractor;

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Compile a selector chain, skipping entries that fail to parse. Errors only
/// when nothing in the chain survives.
pub(crate) fn compile_selectors(sources: &[&str]) -> Result<Vec<Selector>> {
    let mut compiled = Vec::with_capacity(sources.len());
    for source in sources {
        match Selector::parse(source) {
            Ok(selector) => compiled.push(selector),
            Err(err) => warn!("skipping invalid selector '{}': {}", source, err),
        }
    }

    if compiled.is_empty() {
        return Err(anyhow!("no valid selectors in chain {:?}", sources));
    }
    Ok(compiled)
}

pub(crate) fn compile_selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|err| anyhow!("invalid selector '{}': {}", source, err))
}

/// Element text with whitespace collapsed: nested spans and indentation in the
/// markup otherwise leak newlines into extracted names.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty text found by a selector chain, searching the whole
/// document.
pub(crate) fn first_text(document: &Html, chain: &[Selector]) -> Option<String> {
    for selector in chain {
        for element in document.select(selector) {
            let text = element_text(&element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First non-empty text found by a selector chain, scoped to one element.
pub(crate) fn first_text_in(element: &ElementRef, chain: &[Selector]) -> Option<String> {
    for selector in chain {
        for found in element.select(selector) {
            let text = element_text(&found);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
