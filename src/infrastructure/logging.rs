//! Logging initialization shared by the crawl and enrich binaries.
//!
//! Console output honors `RUST_LOG`; a non-blocking daily file appender under
//! `logs/` keeps a persistent record of crawl runs.

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "crawler.log";

/// Keeps the background log writer alive for the lifetime of the process.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,html5ever=warn,selectors=warn"));

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    Ok(())
}
