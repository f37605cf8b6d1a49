//! Store seams used by the scanner.
//!
//! Source collections are read-only from the scanner's point of view; the
//! value bet collection is written with upsert semantics and swept at the
//! end of every pass.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

use crate::models::{EventRecord, ValueBetRecord};

/// A scraped collection of event records for one bookmaker.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Collection name, used in logs.
    fn name(&self) -> &str;

    /// Returns every record for the exact `date` (`dd/mm/yy`) and competition.
    async fn find(&self, date: &str, competition: &str) -> Result<Vec<EventRecord>>;
}

/// Destination collection for derived value bets.
#[async_trait]
pub trait ValueBetStore: Send + Sync {
    /// Inserts the record, replacing any record with the same id.
    async fn upsert(&self, record: &ValueBetRecord) -> Result<()>;

    async fn find_one(&self, id: &str) -> Result<Option<ValueBetRecord>>;

    /// Ids of stored records for one reference date and competition.
    async fn ids_in_scope(&self, event_date: &str, competition: &str) -> Result<Vec<String>>;

    /// Deletes every record whose id is not in `keep`. Returns the number deleted.
    async fn delete_except(&self, keep: &HashSet<String>) -> Result<u64>;
}
