//! In-memory stores.
//!
//! Used by tests and dry runs. Both stores can be told to fail specific
//! operations so error paths can be exercised without a database.

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::models::{EventRecord, ValueBetRecord};
use crate::store::{EventSource, ValueBetStore};

/// Event collection held in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSource {
    name: String,
    events: RwLock<Vec<EventRecord>>,
    failing_competitions: RwLock<HashSet<String>>,
}

impl MemoryEventSource {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_events(name: impl Into<String>, events: Vec<EventRecord>) -> Self {
        let source = Self::new(name);
        *source.events.write() = events;
        source
    }

    pub fn replace_all(&self, events: Vec<EventRecord>) {
        *self.events.write() = events;
    }

    /// Makes every `find` for `competition` return an error.
    pub fn fail_competition(&self, competition: impl Into<String>) {
        self.failing_competitions.write().insert(competition.into());
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, date: &str, competition: &str) -> Result<Vec<EventRecord>> {
        if self.failing_competitions.read().contains(competition) {
            bail!("{}: query failed for {competition} on {date}", self.name);
        }

        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.date == date && e.competition == competition)
            .cloned()
            .collect())
    }
}

/// Value bet collection held in memory.
#[derive(Debug, Default)]
pub struct MemoryValueBetStore {
    records: RwLock<HashMap<String, ValueBetRecord>>,
    failing_ids: RwLock<HashSet<String>>,
    fail_scope_lookups: AtomicBool,
    upserts: AtomicUsize,
}

impl MemoryValueBetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> HashSet<String> {
        self.records.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<ValueBetRecord> {
        self.records.read().get(id).cloned()
    }

    /// Number of successful upserts since creation.
    #[must_use]
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::Relaxed)
    }

    /// Seeds a record directly, bypassing failure injection.
    pub fn seed(&self, record: ValueBetRecord) {
        self.records.write().insert(record.id.clone(), record);
    }

    /// Makes every upsert of `id` fail.
    pub fn fail_upserts_for(&self, id: impl Into<String>) {
        self.failing_ids.write().insert(id.into());
    }

    /// Makes `ids_in_scope` fail.
    pub fn fail_scope_lookups(&self, fail: bool) {
        self.fail_scope_lookups.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl ValueBetStore for MemoryValueBetStore {
    async fn upsert(&self, record: &ValueBetRecord) -> Result<()> {
        if self.failing_ids.read().contains(&record.id) {
            bail!("write rejected for value bet {}", record.id);
        }

        self.records
            .write()
            .insert(record.id.clone(), record.clone());
        self.upserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn find_one(&self, id: &str) -> Result<Option<ValueBetRecord>> {
        Ok(self.get(id))
    }

    async fn ids_in_scope(&self, event_date: &str, competition: &str) -> Result<Vec<String>> {
        if self.fail_scope_lookups.load(Ordering::Relaxed) {
            bail!("scope lookup failed for {competition} on {event_date}");
        }

        Ok(self
            .records
            .read()
            .values()
            .filter(|r| r.event_date == event_date && r.competition == competition)
            .map(|r| r.id.clone())
            .collect())
    }

    async fn delete_except(&self, keep: &HashSet<String>) -> Result<u64> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|id, _| keep.contains(id));
        Ok((before - records.len()) as u64)
    }
}
