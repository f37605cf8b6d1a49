//! Event snapshot repository.
//!
//! Reads scraped bookmaker records stored as JSONB documents, one logical
//! collection per bookmaker and feed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::warn;

use crate::models::EventRecord;
use crate::store::EventSource;

/// Repository for one source collection.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
    collection: String,
}

impl EventRepository {
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
impl EventSource for EventRepository {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn find(&self, date: &str, competition: &str) -> Result<Vec<EventRecord>> {
        let rows: Vec<(String, Json<serde_json::Value>)> = sqlx::query_as(
            r#"
            SELECT id, document
            FROM event_snapshots
            WHERE collection = $1 AND date = $2 AND competition = $3
            "#,
        )
        .bind(&self.collection)
        .bind(date)
        .bind(competition)
        .fetch_all(&self.pool)
        .await
        .with_context(|| {
            format!(
                "{}: failed to fetch {competition} on {date}",
                self.collection
            )
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, Json(document)) in rows {
            match serde_json::from_value::<EventRecord>(document) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    collection = %self.collection,
                    id = %id,
                    error = %e,
                    "Skipping malformed event document"
                ),
            }
        }

        Ok(records)
    }
}
