//! Listing-page extraction: format listing rows into tournament summaries.

use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::{compile_selector, compile_selectors, element_text, first_text_in};
use super::error::{ParseError, ParseResult};
use crate::domain::tournament::TournamentSummary;

/// Row strategies in priority order; the listing table's class has changed
/// across site redesigns, so the chain ends at bare table rows.
const ROW_SELECTORS: &[&str] = &[".table-sm tbody tr", "table tbody tr", "table tr"];

const DETAIL_LINK_SELECTOR: &str = "a[href*='/tournament/']";

/// Date-cell strategies: current markup carries the date in the first column,
/// an older variant in the fourth. The row-text regex below is the last
/// resort.
const DATE_CELL_SELECTORS: &[&str] = &["td:nth-child(1)", "td:nth-child(4)"];

/// Accepted date renderings, tried in order.
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%Y-%m-%d"];

/// Only events whose name mentions one of these survive; the listing mixes
/// high-value events with casual queues not worth ingesting.
const RELEVANT_KEYWORDS: &[&str] = &[
    "challenge",
    "championship",
    "qualifier",
    "showcase",
    "premier",
    "league",
];

static ROW_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bon\s+([A-Z][a-z]+ \d{1,2}, \d{4}|\d{4}-\d{2}-\d{2})").unwrap()
});

pub struct TournamentListExtractor {
    row_selectors: Vec<Selector>,
    link_selector: Selector,
    date_cell_selectors: Vec<Selector>,
}

impl TournamentListExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row_selectors: compile_selectors(ROW_SELECTORS)?,
            link_selector: compile_selector(DETAIL_LINK_SELECTOR)?,
            date_cell_selectors: compile_selectors(DATE_CELL_SELECTORS)?,
        })
    }

    /// Extract tournament summaries from a format listing page, in source row
    /// order. Rows without a detail link or a relevant name are skipped
    /// silently; rows whose date cannot be parsed are dropped with a warning.
    pub fn extract(&self, html: &str, base_url: &str) -> Vec<TournamentSummary> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(err) => {
                warn!("invalid base url '{}': {}", base_url, err);
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        let rows = self.select_rows(&document);
        debug!("listing page yielded {} candidate rows", rows.len());

        rows.iter()
            .filter_map(|row| self.extract_row(row, &base))
            .collect()
    }

    /// First row strategy that matches anything wins.
    fn select_rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.row_selectors {
            let rows: Vec<ElementRef<'a>> = document.select(selector).collect();
            if !rows.is_empty() {
                return rows;
            }
        }
        Vec::new()
    }

    fn extract_row(&self, row: &ElementRef, base: &Url) -> Option<TournamentSummary> {
        let link = row.select(&self.link_selector).next()?;
        let name = element_text(&link);
        if name.is_empty() {
            return None;
        }

        let raw_date = self.find_date_text(row);
        if !is_relevant(&name) {
            return None;
        }

        let Some(raw_date) = raw_date else {
            warn!("dropping '{}': no date text found in row", name);
            return None;
        };

        let date = match parse_event_date(&raw_date) {
            Ok(date) => date,
            Err(err) => {
                warn!("dropping '{}': {}", name, err);
                return None;
            }
        };

        let href = link.value().attr("href")?;
        let url = match base.join(href) {
            Ok(url) => url,
            Err(err) => {
                warn!("dropping '{}': bad detail href '{}': {}", name, href, err);
                return None;
            }
        };
        let external_id = external_id_from(&url)?;

        Some(TournamentSummary {
            external_id,
            name,
            date,
            url: url.to_string(),
        })
    }

    /// Date string for a row: first non-empty date cell wins, then a scan of
    /// the row's full text.
    fn find_date_text(&self, row: &ElementRef) -> Option<String> {
        if let Some(text) = first_text_in(row, &self.date_cell_selectors) {
            return Some(text);
        }

        ROW_DATE_RE
            .captures(&element_text(row))
            .map(|captures| captures[1].to_string())
    }
}

fn is_relevant(name: &str) -> bool {
    let lowered = name.to_lowercase();
    RELEVANT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

fn parse_event_date(raw: &str) -> ParseResult<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok())
        .ok_or_else(|| ParseError::unparsable_date(raw))
}

/// Stable per-tournament identifier: the last path segment of the detail URL.
fn external_id_from(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = "https://site.test";

    fn extractor() -> TournamentListExtractor {
        TournamentListExtractor::new().unwrap()
    }

    fn listing(rows: &str) -> String {
        format!(
            r#"<html><body><table class="table table-sm"><tbody>{rows}</tbody></table></body></html>"#
        )
    }

    #[rstest]
    #[case("Feb 8, 2026", 2026, 2, 8)]
    #[case("Dec 31, 2025", 2025, 12, 31)]
    #[case("2026-02-08", 2026, 2, 8)]
    fn accepted_date_formats(
        #[case] raw: &str,
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
    ) {
        let expected = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        assert_eq!(parse_event_date(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("February 8, 2026")]
    #[case("8 Feb 2026")]
    #[case("tomorrow")]
    #[case("")]
    fn rejected_date_formats(#[case] raw: &str) {
        assert!(matches!(
            parse_event_date(raw),
            Err(ParseError::UnparsableDate { .. })
        ));
    }

    #[test]
    fn extracts_summaries_in_row_order() {
        let html = listing(concat!(
            r#"<tr><td>Feb 8, 2026</td><td><a href="/tournament/modern-challenge-96-2026-02-08">Modern Challenge 96</a></td></tr>"#,
            r#"<tr><td>Feb 7, 2026</td><td><a href="/tournament/modern-qualifier-2026-02-07">Modern Qualifier</a></td></tr>"#,
        ));

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "Modern Challenge 96");
        assert_eq!(summaries[0].external_id, "modern-challenge-96-2026-02-08");
        assert_eq!(
            summaries[0].url,
            "https://site.test/tournament/modern-challenge-96-2026-02-08"
        );
        assert_eq!(
            summaries[0].date,
            NaiveDate::from_ymd_opt(2026, 2, 8).unwrap()
        );
        assert_eq!(summaries[1].external_id, "modern-qualifier-2026-02-07");
    }

    #[test]
    fn rows_without_detail_links_are_skipped() {
        let html = listing(concat!(
            r#"<tr><td>Feb 8, 2026</td><td>Standings update</td></tr>"#,
            r#"<tr><td>Feb 8, 2026</td><td><a href="/tournament/standard-challenge-2026-02-08">Standard Challenge</a></td></tr>"#,
        ));

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "Standard Challenge");
    }

    #[test]
    fn irrelevant_events_are_filtered_out() {
        let html = listing(concat!(
            r#"<tr><td>Feb 8, 2026</td><td><a href="/tournament/commander-clash-17">Commander Clash</a></td></tr>"#,
            r#"<tr><td>Feb 8, 2026</td><td><a href="/tournament/pioneer-showcase-2026-02-08">Pioneer Showcase</a></td></tr>"#,
        ));

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "Pioneer Showcase");
    }

    #[test]
    fn unparsable_dates_drop_the_row_without_aborting() {
        let html = listing(concat!(
            r#"<tr><td>whenever</td><td><a href="/tournament/legacy-challenge-1">Legacy Challenge</a></td></tr>"#,
            r#"<tr><td>Feb 8, 2026</td><td><a href="/tournament/legacy-challenge-2">Legacy Challenge</a></td></tr>"#,
        ));

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].external_id, "legacy-challenge-2");
    }

    #[test]
    fn falls_back_to_bare_table_rows() {
        let html = r#"<html><body><table><tr><td>2026-02-08</td><td><a href="/tournament/vintage-premier-9">Vintage Premier</a></td></tr></table></body></html>"#;

        let summaries = extractor().extract(html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].external_id, "vintage-premier-9");
    }

    #[test]
    fn date_is_taken_from_fourth_column_when_first_is_empty() {
        let html = listing(
            r#"<tr><td></td><td><a href="/tournament/modern-league-2026-02-06">Modern League</a></td><td>312 players</td><td>2026-02-06</td></tr>"#,
        );

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(
            summaries[0].date,
            NaiveDate::from_ymd_opt(2026, 2, 6).unwrap()
        );
    }

    #[test]
    fn date_is_recovered_from_row_text_when_cells_are_empty() {
        let html = listing(
            r#"<tr><td></td><td><a href="/tournament/pauper-challenge-44">Pauper Challenge</a> played on Feb 5, 2026</td></tr>"#,
        );

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(
            summaries[0].date,
            NaiveDate::from_ymd_opt(2026, 2, 5).unwrap()
        );
    }

    #[test]
    fn absolute_detail_links_are_kept_as_is() {
        let html = listing(
            r#"<tr><td>Feb 8, 2026</td><td><a href="https://other.test/tournament/duel-commander-qualifier-3">Duel Commander Qualifier</a></td></tr>"#,
        );

        let summaries = extractor().extract(&html, BASE);

        assert_eq!(summaries.len(), 1);
        assert_eq!(
            summaries[0].url,
            "https://other.test/tournament/duel-commander-qualifier-3"
        );
        assert_eq!(summaries[0].external_id, "duel-commander-qualifier-3");
    }

    #[test]
    fn empty_page_yields_no_summaries() {
        let summaries = extractor().extract("<html><body><p>nothing here</p></body></html>", BASE);
        assert!(summaries.is_empty());
    }
}
