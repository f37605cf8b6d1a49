//! Data storage for the value bet scanner.
//!
//! This crate provides:
//! - Models for scraped event records and derived value bets
//! - Store traits the scanner is written against
//! - `PostgreSQL` repositories and a database client
//! - In-memory stores for tests and dry runs

pub mod database;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use database::DatabaseClient;
pub use memory::{MemoryEventSource, MemoryValueBetStore};
pub use models::{
    EventRecord, MarketNode, MarketTree, ValueBetEntry, ValueBetRecord, ValueNode, ValueTree,
};
pub use repositories::{EventRepository, ValueBetRepository};
pub use store::{EventSource, ValueBetStore};
