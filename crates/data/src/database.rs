use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::repositories::{EventRepository, ValueBetRepository};

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS event_snapshots (
        collection  TEXT NOT NULL,
        id          TEXT NOT NULL,
        date        TEXT NOT NULL,
        competition TEXT NOT NULL,
        document    JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS event_snapshots_shard_idx
        ON event_snapshots (collection, date, competition)
    ",
    r"
    CREATE TABLE IF NOT EXISTS value_bets (
        collection  TEXT NOT NULL,
        id          TEXT NOT NULL,
        event_date  TEXT NOT NULL,
        competition TEXT NOT NULL,
        document    JSONB NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (collection, id)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS value_bets_scope_idx
        ON value_bets (collection, event_date, competition)
    ",
];

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates tables and indexes if they do not exist.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        info!("Database schema ready");
        Ok(())
    }

    /// Repository reading one source collection.
    #[must_use]
    pub fn event_source(&self, collection: &str) -> EventRepository {
        EventRepository::new(self.pool.clone(), collection)
    }

    /// Repository for one value bet collection.
    #[must_use]
    pub fn value_bets(&self, collection: &str) -> ValueBetRepository {
        ValueBetRepository::new(self.pool.clone(), collection)
    }
}
