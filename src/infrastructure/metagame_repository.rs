//! Repository over the metagame schema: tournaments, decklists, card lines,
//! and the card metadata table.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::card::{CardMetadata, StoredCard};
use crate::domain::tournament::{CardLine, DecklistRecord, StoredTournament, TournamentSummary};

#[derive(Clone)]
pub struct MetagameRepository {
    pool: SqlitePool,
}

impl MetagameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a tournament or, when its external id is already known, refresh
    /// the mutable fields. Returns the row id either way. The update path
    /// must never replace the row wholesale: decklists hang off the row id,
    /// and a delete-and-reinsert would cascade them away.
    pub async fn upsert_tournament(
        &self,
        summary: &TournamentSummary,
        format: &str,
        source: &str,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournaments (external_id, name, date, format, url, source)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                date = excluded.date,
                url = excluded.url,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
        )
        .bind(&summary.external_id)
        .bind(&summary.name)
        .bind(summary.date)
        .bind(format)
        .bind(&summary.url)
        .bind(source)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    pub async fn find_tournament(&self, external_id: &str) -> Result<Option<StoredTournament>> {
        let row = sqlx::query(
            r#"
            SELECT id, external_id, name, date, format, url, source
            FROM tournaments
            WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(StoredTournament {
                id: row.try_get("id")?,
                external_id: row.try_get("external_id")?,
                name: row.try_get("name")?,
                date: row.try_get("date")?,
                format: row.try_get("format")?,
                url: row.try_get("url")?,
                source: row.try_get("source")?,
            })
        })
        .transpose()
    }

    /// Insert a decklist owned by a tournament and return its row id.
    // TODO: dedupe decklists by external_url so a re-crawled tournament does
    // not accumulate duplicate rows for the same deck.
    pub async fn insert_decklist(
        &self,
        tournament_id: i64,
        record: &DecklistRecord,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO decklists (tournament_id, player_name, rank, deck_name, external_url)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(tournament_id)
        .bind(&record.player_name)
        .bind(record.rank)
        .bind(&record.deck_name)
        .bind(&record.url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    /// Create a bare card row for every name that does not have one yet.
    /// Existing rows, enriched or not, are left untouched.
    pub async fn ensure_cards(&self, names: &[&str]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for name in names {
            sqlx::query("INSERT OR IGNORE INTO cards (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Write a decklist's card lines in one transaction.
    pub async fn insert_decklist_cards(&self, decklist_id: i64, lines: &[CardLine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO decklist_cards (decklist_id, card_name, quantity, is_sideboard)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(decklist_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.is_sideboard)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Names of cards still missing metadata, alphabetical, capped at
    /// `limit`. Alphabetical order keeps enrichment batches stable across
    /// runs.
    pub async fn card_names_missing_metadata(&self, limit: u32) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT name FROM cards
            WHERE cmc IS NULL OR type_line IS NULL
            ORDER BY name
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("name").map_err(Into::into))
            .collect()
    }

    /// Fill in a card's metadata. Guarded so an already-enriched row is never
    /// overwritten; returns whether a row was actually updated.
    pub async fn apply_card_metadata(
        &self,
        metadata: &CardMetadata,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cards
            SET mana_cost = ?, cmc = ?, type_line = ?, is_land = ?, scryfall_uri = ?, updated_at = ?
            WHERE name = ? AND (cmc IS NULL OR type_line IS NULL)
            "#,
        )
        .bind(&metadata.mana_cost)
        .bind(metadata.cmc)
        .bind(&metadata.type_line)
        .bind(metadata.is_land)
        .bind(&metadata.scryfall_uri)
        .bind(updated_at)
        .bind(&metadata.name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_card(&self, name: &str) -> Result<Option<StoredCard>> {
        let row = sqlx::query(
            r#"
            SELECT name, mana_cost, cmc, type_line, is_land, scryfall_uri, updated_at
            FROM cards
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(StoredCard {
                name: row.try_get("name")?,
                mana_cost: row.try_get("mana_cost")?,
                cmc: row.try_get("cmc")?,
                type_line: row.try_get("type_line")?,
                is_land: row.try_get("is_land")?,
                scryfall_uri: row.try_get("scryfall_uri")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    pub async fn count_tournaments(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM tournaments").await
    }

    pub async fn count_decklists(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM decklists").await
    }

    pub async fn count_decklist_cards(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM decklist_cards").await
    }

    async fn count(&self, query: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(query).fetch_one(&self.pool).await?)
    }
}
