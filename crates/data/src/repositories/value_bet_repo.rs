//! Value bet repository.
//!
//! Stores derived value bets as JSONB documents keyed by their
//! deterministic id, with the sweep scope kept in plain columns.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::models::ValueBetRecord;
use crate::store::ValueBetStore;

/// Repository for one value bet collection.
#[derive(Debug, Clone)]
pub struct ValueBetRepository {
    pool: PgPool,
    collection: String,
}

impl ValueBetRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl ValueBetStore for ValueBetRepository {
    async fn upsert(&self, record: &ValueBetRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO value_bets (collection, id, event_date, competition, document, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (collection, id) DO UPDATE
            SET event_date = EXCLUDED.event_date,
                competition = EXCLUDED.competition,
                document = EXCLUDED.document,
                updated_at = NOW()
            "#,
        )
        .bind(&self.collection)
        .bind(&record.id)
        .bind(&record.event_date)
        .bind(&record.competition)
        .bind(Json(record))
        .execute(&self.pool)
        .await
        .with_context(|| format!("{}: failed to upsert value bet {}", self.collection, record.id))?;

        Ok(())
    }

    async fn find_one(&self, id: &str) -> Result<Option<ValueBetRecord>> {
        let row: Option<(Json<ValueBetRecord>,)> = sqlx::query_as(
            r#"
            SELECT document
            FROM value_bets
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(&self.collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(record),)| record))
    }

    async fn ids_in_scope(&self, event_date: &str, competition: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM value_bets
            WHERE collection = $1 AND event_date = $2 AND competition = $3
            "#,
        )
        .bind(&self.collection)
        .bind(event_date)
        .bind(competition)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn delete_except(&self, keep: &HashSet<String>) -> Result<u64> {
        let keep: Vec<String> = keep.iter().cloned().collect();

        let result = sqlx::query(
            r#"
            DELETE FROM value_bets
            WHERE collection = $1 AND NOT (id = ANY($2))
            "#,
        )
        .bind(&self.collection)
        .bind(keep)
        .execute(&self.pool)
        .await
        .with_context(|| format!("{}: sweep failed", self.collection))?;

        Ok(result.rows_affected())
    }
}
