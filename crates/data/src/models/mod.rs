//! Data models for the value bet scanner.
//!
//! Odds use `rust_decimal::Decimal` so thresholds compare exactly.
//! Models are stored as JSON documents.

pub mod event;
pub mod value_bet;

pub use event::{EventRecord, MarketNode, MarketTree, CLOCK_FORMAT, DATE_FORMAT, KICKOFF_FORMAT};
pub use value_bet::{ValueBetEntry, ValueBetRecord, ValueNode, ValueTree};
