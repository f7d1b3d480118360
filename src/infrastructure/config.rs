//! Environment-backed configuration for the crawl and enrichment binaries.
//!
//! Everything is read from the process environment (a `.env` file is honored
//! by the binaries before this module runs). `DATABASE_URL` is the only
//! required variable; the rest fall back to sensible defaults so a bare
//! `FORMATS=modern cargo run` works against the live site.

use std::env;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_GOLDFISH_BASE_URL: &str = "https://www.mtggoldfish.com";
pub const DEFAULT_SCRYFALL_BASE_URL: &str = "https://api.scryfall.com";

const DEFAULT_FORMAT: &str = "standard";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ENRICH_BATCH_LIMIT: u32 = 500;
const DEFAULT_MAX_FETCH_RETRIES: u32 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set; refusing to start without a store")]
    MissingDatabaseUrl,

    #[error("{var} is set to '{value}', which is not a valid number")]
    InvalidNumber { var: &'static str, value: String },
}

/// Runtime configuration shared by the crawl and enrich binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Formats to crawl, lowercased (`FORMATS`, comma-separated).
    pub formats: Vec<String>,
    /// SQLite connection string (`DATABASE_URL`), e.g. `sqlite:data/meta.db`.
    pub database_url: String,
    /// Root of the tournament results site (`GOLDFISH_BASE_URL`).
    pub goldfish_base_url: String,
    /// Root of the card metadata API (`SCRYFALL_BASE_URL`).
    pub scryfall_base_url: String,
    /// Per-request timeout for both HTTP clients (`REQUEST_TIMEOUT_SECS`).
    pub request_timeout_secs: u64,
    /// Upper bound on cards pulled per enrichment run (`ENRICH_BATCH_LIMIT`).
    pub enrich_batch_limit: u32,
    /// Retry budget for retryable page-fetch failures (`MAX_FETCH_RETRIES`).
    pub max_fetch_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Err(ConfigError::MissingDatabaseUrl),
        };

        Ok(Self {
            formats: parse_formats(&env_or("FORMATS", DEFAULT_FORMAT)),
            database_url,
            goldfish_base_url: env_or("GOLDFISH_BASE_URL", DEFAULT_GOLDFISH_BASE_URL),
            scryfall_base_url: env_or("SCRYFALL_BASE_URL", DEFAULT_SCRYFALL_BASE_URL),
            request_timeout_secs: env_number("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            enrich_batch_limit: env_number("ENRICH_BATCH_LIMIT", DEFAULT_ENRICH_BATCH_LIMIT)?,
            max_fetch_retries: env_number("MAX_FETCH_RETRIES", DEFAULT_MAX_FETCH_RETRIES)?,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn env_number<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        _ => Ok(default),
    }
}

/// Split a comma-separated format list, trimming and lowercasing each entry.
/// Empty entries are dropped; an all-empty input falls back to the default.
fn parse_formats(raw: &str) -> Vec<String> {
    let formats: Vec<String> = raw
        .split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect();

    if formats.is_empty() {
        vec![DEFAULT_FORMAT.to_string()]
    } else {
        formats
    }
}
