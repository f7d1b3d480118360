//! SQLite connection management and schema migration.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

const MAX_CONNECTIONS: u32 = 5;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Open (creating the file and parent directories if needed) the database
    /// at `database_url`, e.g. `sqlite:data/meta.db` or `sqlite::memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let in_memory = path.is_empty() || path.starts_with(":memory:");

        if !in_memory {
            let path = Path::new(path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("creating database directory {parent:?}"))?;
                }
            }
            if !path.exists() {
                std::fs::File::create(path)
                    .with_context(|| format!("creating database file {path:?}"))?;
            }
        }

        // Each pooled connection to an in-memory database would see its own
        // private database, so those pools are capped at one connection.
        let max_connections = if in_memory { 1 } else { MAX_CONNECTIONS };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;

        info!("Database connected: {}", database_url);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema if it does not exist yet. Safe to run on every
    /// startup.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tournaments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                format TEXT NOT NULL,
                url TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT 'mtggoldfish',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decklists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tournament_id INTEGER NOT NULL REFERENCES tournaments(id) ON DELETE CASCADE,
                player_name TEXT NOT NULL,
                rank INTEGER NOT NULL DEFAULT 0,
                deck_name TEXT NOT NULL,
                external_url TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decklist_cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                decklist_id INTEGER NOT NULL REFERENCES decklists(id) ON DELETE CASCADE,
                card_name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                is_sideboard BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cards (
                name TEXT PRIMARY KEY,
                mana_cost TEXT,
                cmc REAL,
                type_line TEXT,
                is_land BOOLEAN,
                scryfall_uri TEXT,
                updated_at DATETIME
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_tournaments_date ON tournaments(date)",
            "CREATE INDEX IF NOT EXISTS idx_decklists_tournament ON decklists(tournament_id)",
            "CREATE INDEX IF NOT EXISTS idx_decklist_cards_decklist ON decklist_cards(decklist_id)",
            "CREATE INDEX IF NOT EXISTS idx_decklist_cards_name ON decklist_cards(card_name)",
        ];
        for statement in indexes {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        info!("Database schema ready");
        Ok(())
    }
}
