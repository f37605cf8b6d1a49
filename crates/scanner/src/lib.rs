//! Value bet detection between a sharp bookmaker and softer books.
//!
//! # Overview
//!
//! The sharp book's prices are de-vigged into fair prices. Where another
//! book pays noticeably more than that fair price, inside a plausible band,
//! the condition is recorded as a value bet:
//!
//! ```text
//! Pinnacle:  1.90 / 1.90   ->  fair 2.00 / 2.00
//! Stake:     2.10 / 1.75
//!
//! Condition 0: 2.10 vs fair 2.00  ->  ROI 5.0%
//! ```
//!
//! # Modules
//!
//! - [`normalizer`]: No-vig odds
//! - [`equalizer`]: Align two market trees on their common keys
//! - [`matcher`]: Pair events across bookmakers by fuzzy fixture name
//! - [`comparator`]: Price rules and value bet record assembly
//! - [`pruner`]: Strip empty and unusable results
//! - [`freshness`]: Kickoff and staleness filters
//! - [`orchestrator`]: Sharded scan passes and the end-of-pass sweep
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use valuebet_scanner::{SourcePair, ValueBetScanner};
//!
//! let pair = SourcePair::new(pinnacle, stake);
//! let scanner = ValueBetScanner::new(config, vec![pair], Arc::new(store));
//!
//! let summary = scanner.run_pass().await?;
//! println!("{summary}");
//! ```

pub mod comparator;
pub mod equalizer;
pub mod error;
pub mod freshness;
pub mod matcher;
pub mod normalizer;
pub mod orchestrator;
pub mod pruner;

pub use comparator::{value_bet_id, MarketComparator};
pub use equalizer::equalize;
pub use error::{NormalizeError, ScanError};
pub use freshness::FreshnessPolicy;
pub use matcher::{token_sort_similarity, EventMatcher, MatchConfig};
pub use normalizer::{implied_probabilities, no_vig_odds, normalize_tree};
pub use orchestrator::{PassSummary, ScanScope, ShardPlan, SourcePair, ValueBetScanner};
pub use pruner::{prune_record, prune_tree};
