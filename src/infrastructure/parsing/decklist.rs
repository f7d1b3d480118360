//! Decklist-page extraction: header fields plus mainboard/sideboard card
//! lines.
//!
//! Card lines come from a two-tier strategy. The primary tier reads the named
//! mainboard/sideboard containers and tags lines by which container they came
//! from. When those containers are absent or renamed, the positional tier
//! treats every deck-table-like block as mainboard if it is the first such
//! block and sideboard otherwise. Event coverage pages are not contractually
//! stable, which is the whole reason the second tier exists.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::error::{ParseError, ParseResult};
use super::{compile_selector, compile_selectors, first_text, first_text_in};
use crate::domain::tournament::{CardLine, DecklistRecord};

const AUTHOR_SELECTORS: &[&str] = &[".deck-view-header-author", ".deck-view-author"];
const TITLE_SELECTORS: &[&str] = &[".deck-view-title", ".deck-view-header h1"];
const RANK_SELECTORS: &[&str] = &[".deck-view-header-rank", ".deck-view-rank"];

const MAINBOARD_ROWS_SELECTOR: &str = "#deck-view-tab-mainboard .deck-list-table tr";
const SIDEBOARD_ROWS_SELECTOR: &str = "#deck-view-tab-sideboard .deck-list-table tr";

/// Positional-tier block strategies. `.deck-table` shows up on older event
/// coverage pages.
const BLOCK_SELECTORS: &[&str] = &[".deck-list-table", ".deck-table"];
const ROW_SELECTOR: &str = "tr";

const QTY_SELECTORS: &[&str] = &[".deck-col-qty", "td:nth-child(1)"];
const NAME_SELECTORS: &[&str] = &[".deck-col-card a", ".deck-col-card", "td:nth-child(2)"];

static RANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());

pub struct DecklistExtractor {
    author_selectors: Vec<Selector>,
    title_selectors: Vec<Selector>,
    rank_selectors: Vec<Selector>,
    mainboard_rows: Selector,
    sideboard_rows: Selector,
    block_selectors: Vec<Selector>,
    row_selector: Selector,
    qty_selectors: Vec<Selector>,
    name_selectors: Vec<Selector>,
}

impl DecklistExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            author_selectors: compile_selectors(AUTHOR_SELECTORS)?,
            title_selectors: compile_selectors(TITLE_SELECTORS)?,
            rank_selectors: compile_selectors(RANK_SELECTORS)?,
            mainboard_rows: compile_selector(MAINBOARD_ROWS_SELECTOR)?,
            sideboard_rows: compile_selector(SIDEBOARD_ROWS_SELECTOR)?,
            block_selectors: compile_selectors(BLOCK_SELECTORS)?,
            row_selector: compile_selector(ROW_SELECTOR)?,
            qty_selectors: compile_selectors(QTY_SELECTORS)?,
            name_selectors: compile_selectors(NAME_SELECTORS)?,
        })
    }

    /// Extract one decklist record from a deck detail page. Player and deck
    /// name are required; rank defaults to 0 when the page carries none; a
    /// page yielding zero card lines is an error.
    pub fn extract(&self, html: &str, url: &str) -> ParseResult<DecklistRecord> {
        let document = Html::parse_document(html);

        let player_name = self
            .extract_player(&document)
            .ok_or(ParseError::required("player name"))?;
        let deck_name = first_text(&document, &self.title_selectors)
            .ok_or(ParseError::required("deck name"))?;
        let rank = self.extract_rank(&document);

        let cards = self.extract_card_lines(&document);
        if cards.is_empty() {
            return Err(ParseError::NoCardLines);
        }

        Ok(DecklistRecord {
            url: url.to_string(),
            player_name,
            rank,
            deck_name,
            cards,
        })
    }

    fn extract_player(&self, document: &Html) -> Option<String> {
        let raw = first_text(document, &self.author_selectors)?;
        let stripped = strip_author_label(&raw);
        (!stripped.is_empty()).then_some(stripped)
    }

    /// Placement number from the header, e.g. "1st Place" or "(3rd)". Pages
    /// without one (leagues, showcases) get rank 0.
    fn extract_rank(&self, document: &Html) -> u32 {
        first_text(document, &self.rank_selectors)
            .and_then(|text| {
                RANK_RE
                    .captures(&text)
                    .and_then(|captures| captures[1].parse().ok())
            })
            .unwrap_or(0)
    }

    fn extract_card_lines(&self, document: &Html) -> Vec<CardLine> {
        let tiers: [(&str, fn(&Self, &Html) -> Vec<CardLine>); 2] = [
            ("named containers", Self::lines_from_named_containers),
            ("positional blocks", Self::lines_from_positional_blocks),
        ];

        for (label, tier) in tiers {
            let lines = tier(self, document);
            if !lines.is_empty() {
                debug!("card lines extracted via {} strategy", label);
                return lines;
            }
        }
        Vec::new()
    }

    /// Primary tier: rows under the named mainboard and sideboard containers.
    fn lines_from_named_containers(&self, document: &Html) -> Vec<CardLine> {
        let mut lines: Vec<CardLine> = document
            .select(&self.mainboard_rows)
            .filter_map(|row| self.parse_card_row(&row, false))
            .collect();
        lines.extend(
            document
                .select(&self.sideboard_rows)
                .filter_map(|row| self.parse_card_row(&row, true)),
        );
        lines
    }

    /// Positional tier: first deck-table block is the mainboard, every later
    /// block is sideboard.
    fn lines_from_positional_blocks(&self, document: &Html) -> Vec<CardLine> {
        for block_selector in &self.block_selectors {
            let mut lines = Vec::new();
            for (index, block) in document.select(block_selector).enumerate() {
                let is_sideboard = index > 0;
                lines.extend(
                    block
                        .select(&self.row_selector)
                        .filter_map(|row| self.parse_card_row(&row, is_sideboard)),
                );
            }
            if !lines.is_empty() {
                return lines;
            }
        }
        Vec::new()
    }

    /// A row is kept only when both quantity and name extract cleanly; header
    /// and spacer rows fall out here.
    fn parse_card_row(&self, row: &ElementRef, is_sideboard: bool) -> Option<CardLine> {
        let quantity = parse_quantity(&first_text_in(row, &self.qty_selectors)?)?;
        let name = first_text_in(row, &self.name_selectors)?;

        Some(CardLine {
            name,
            quantity,
            is_sideboard,
        })
    }
}

/// Drop a leading "by" label from the author line, leaving names that merely
/// start with those letters alone.
fn strip_author_label(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("by ")
        .or_else(|| trimmed.strip_prefix("By "))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Quantity from leading digits, tolerating trailing markup debris. Zero is
/// not a valid card count.
fn parse_quantity(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let quantity: u32 = digits.parse().ok()?;
    (quantity > 0).then_some(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "https://site.test/deck/7001001";

    fn extractor() -> DecklistExtractor {
        DecklistExtractor::new().unwrap()
    }

    fn deck_page(header: &str, body: &str) -> String {
        format!(r#"<html><body><div class="deck-view">{header}{body}</div></body></html>"#)
    }

    fn standard_header() -> &'static str {
        concat!(
            r#"<h1 class="deck-view-title">Izzet Murktide</h1>"#,
            r#"<span class="deck-view-header-author">by PlayerOne</span>"#,
            r#"<span class="deck-view-header-rank">2nd Place</span>"#,
        )
    }

    #[test]
    fn extracts_full_record_from_named_containers() {
        let html = deck_page(
            standard_header(),
            concat!(
                r#"<div id="deck-view-tab-mainboard"><table class="deck-list-table">"#,
                r#"<tr><th>Qty</th><th>Card</th></tr>"#,
                r#"<tr><td class="deck-col-qty">4</td><td class="deck-col-card"><a href="/price/x">Ragavan, Nimble Pilferer</a></td></tr>"#,
                r#"<tr><td class="deck-col-qty">2</td><td class="deck-col-card"><a href="/price/y">Murktide Regent</a></td></tr>"#,
                r#"</table></div>"#,
                r#"<div id="deck-view-tab-sideboard"><table class="deck-list-table">"#,
                r#"<tr><td class="deck-col-qty">3</td><td class="deck-col-card"><a href="/price/z">Flusterstorm</a></td></tr>"#,
                r#"</table></div>"#,
            ),
        );

        let record = extractor().extract(&html, URL).unwrap();

        assert_eq!(record.url, URL);
        assert_eq!(record.player_name, "PlayerOne");
        assert_eq!(record.deck_name, "Izzet Murktide");
        assert_eq!(record.rank, 2);
        assert_eq!(
            record.cards,
            vec![
                CardLine {
                    name: "Ragavan, Nimble Pilferer".to_string(),
                    quantity: 4,
                    is_sideboard: false,
                },
                CardLine {
                    name: "Murktide Regent".to_string(),
                    quantity: 2,
                    is_sideboard: false,
                },
                CardLine {
                    name: "Flusterstorm".to_string(),
                    quantity: 3,
                    is_sideboard: true,
                },
            ]
        );
    }

    #[test]
    fn positional_tier_tags_first_block_mainboard_rest_sideboard() {
        let html = deck_page(
            standard_header(),
            concat!(
                r#"<table class="deck-list-table">"#,
                r#"<tr><td>4</td><td>Lightning Bolt</td></tr>"#,
                r#"<tr><td>20</td><td>Mountain</td></tr>"#,
                r#"</table>"#,
                r#"<table class="deck-list-table">"#,
                r#"<tr><td>2</td><td>Smash to Smithereens</td></tr>"#,
                r#"</table>"#,
            ),
        );

        let record = extractor().extract(&html, URL).unwrap();

        assert_eq!(record.cards.len(), 3);
        assert!(!record.cards[0].is_sideboard);
        assert!(!record.cards[1].is_sideboard);
        assert!(record.cards[2].is_sideboard);
        assert_eq!(record.cards[1].name, "Mountain");
        assert_eq!(record.cards[1].quantity, 20);
    }

    #[test]
    fn oldest_coverage_markup_is_still_readable() {
        let html = deck_page(
            r#"<div class="deck-view-header"><h1>Mono Green Tron</h1></div><span class="deck-view-author">By BigMana</span>"#,
            concat!(
                r#"<table class="deck-table">"#,
                r#"<tr><td>4</td><td>Karn Liberated</td></tr>"#,
                r#"</table>"#,
            ),
        );

        let record = extractor().extract(&html, URL).unwrap();

        assert_eq!(record.player_name, "BigMana");
        assert_eq!(record.deck_name, "Mono Green Tron");
        assert_eq!(record.rank, 0);
        assert_eq!(record.cards[0].name, "Karn Liberated");
    }

    #[test]
    fn missing_author_is_a_required_field_error() {
        let html = deck_page(
            r#"<h1 class="deck-view-title">Nameless</h1>"#,
            r#"<table class="deck-list-table"><tr><td>4</td><td>Opt</td></tr></table>"#,
        );

        let err = extractor().extract(&html, URL).unwrap_err();
        assert_eq!(
            err,
            ParseError::RequiredFieldMissing {
                field: "player name"
            }
        );
    }

    #[test]
    fn missing_title_is_a_required_field_error() {
        let html = deck_page(
            r#"<span class="deck-view-header-author">by Someone</span>"#,
            r#"<table class="deck-list-table"><tr><td>4</td><td>Opt</td></tr></table>"#,
        );

        let err = extractor().extract(&html, URL).unwrap_err();
        assert_eq!(err, ParseError::RequiredFieldMissing { field: "deck name" });
    }

    #[test]
    fn page_with_no_card_lines_is_an_error() {
        let html = deck_page(standard_header(), r#"<p>Decklist withheld</p>"#);

        let err = extractor().extract(&html, URL).unwrap_err();
        assert_eq!(err, ParseError::NoCardLines);
    }

    #[test]
    fn unparsable_rows_are_dropped_not_fatal() {
        let html = deck_page(
            standard_header(),
            concat!(
                r#"<table class="deck-list-table">"#,
                r#"<tr><td>Creatures (8)</td></tr>"#,
                r#"<tr><td>0</td><td>Ghost Quarter</td></tr>"#,
                r#"<tr><td>4</td><td></td></tr>"#,
                r#"<tr><td>4</td><td>Thoughtseize</td></tr>"#,
                r#"</table>"#,
            ),
        );

        let record = extractor().extract(&html, URL).unwrap();

        assert_eq!(record.cards.len(), 1);
        assert_eq!(record.cards[0].name, "Thoughtseize");
    }

    #[test]
    fn quantity_tolerates_trailing_debris() {
        assert_eq!(parse_quantity("4"), Some(4));
        assert_eq!(parse_quantity(" 4x "), Some(4));
        assert_eq!(parse_quantity("15"), Some(15));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("x4"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[rstest]
    #[case("by PlayerOne", "PlayerOne")]
    #[case("By PlayerOne", "PlayerOne")]
    #[case("  by  PlayerOne ", "PlayerOne")]
    #[case("Toby", "Toby")]
    #[case("by Toby", "Toby")]
    #[case("PlayerOne", "PlayerOne")]
    fn author_label_is_stripped_safely(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_author_label(raw), expected);
    }

    #[test]
    fn rank_is_parsed_from_header_text() {
        let html = deck_page(
            concat!(
                r#"<h1 class="deck-view-title">Amulet Titan</h1>"#,
                r#"<span class="deck-view-header-author">by TitanFan</span>"#,
                r#"<span class="deck-view-header-rank">(17th)</span>"#,
            ),
            r#"<table class="deck-list-table"><tr><td>4</td><td>Primeval Titan</td></tr></table>"#,
        );

        let record = extractor().extract(&html, URL).unwrap();
        assert_eq!(record.rank, 17);
    }
}
