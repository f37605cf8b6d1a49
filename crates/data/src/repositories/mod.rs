//! PostgreSQL repositories.
//!
//! Documents are stored as JSONB next to the few columns queries filter on.

pub mod event_repo;
pub mod value_bet_repo;

pub use event_repo::EventRepository;
pub use value_bet_repo::ValueBetRepository;

