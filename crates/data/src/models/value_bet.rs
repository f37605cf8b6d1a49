//! Value bet model.
//!
//! Derived from a matched pair of event records. The identifier is a pure
//! function of the source record id and both bookmaker names, so re-deriving
//! the same discrepancy overwrites the stored record instead of duplicating it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result tree mirroring the market tree it was derived from.
pub type ValueTree = BTreeMap<String, ValueNode>;

/// One condition of a market where the other book beats the fair price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBetEntry {
    /// Outcome index inside the market list.
    pub condition: usize,
    /// De-vigged price on the reference book.
    pub reference_odds: Decimal,
    /// Price offered by the other book.
    pub other_odds: Decimal,
    /// `((other / reference) - 1) * 100`
    pub roi_pct: Decimal,
}

impl ValueBetEntry {
    /// ROI with one decimal place, e.g. `"5.0%"`.
    #[must_use]
    pub fn roi_display(&self) -> String {
        format!("{:.1}%", self.roi_pct)
    }
}

/// A node of the comparison result tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueNode {
    /// Qualifying conditions of one market.
    Bets(Vec<ValueBetEntry>),
    /// Results for a group of markets.
    Group(BTreeMap<String, ValueNode>),
    /// The two sides disagree on the market's shape; excluded from output.
    Unusable,
}

impl ValueNode {
    /// Number of value bet entries below this node.
    #[must_use]
    pub fn bet_count(&self) -> usize {
        match self {
            Self::Bets(entries) => entries.len(),
            Self::Group(children) => children.values().map(Self::bet_count).sum(),
            Self::Unusable => 0,
        }
    }
}

/// A currently valid value bet, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBetRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// `"Reference - Other"`
    pub bookmaker_name: String,
    /// `"reference_id - other_id"`
    pub match_id: String,
    /// `"A vs B - C vs D"`
    pub teams: String,
    pub sport_name: String,
    pub competition: String,
    /// Reference side's match date; scopes the record for sweeps.
    pub event_date: String,
    /// `"d1 | d2"`
    pub date: String,
    /// `"t1 | t2"`
    pub time: String,
    pub is_live: bool,
    pub created_date: String,
    pub created_time: String,
    /// Earlier of the two source modification times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_bet_age: Option<String>,
    #[serde(default)]
    pub markets: ValueTree,
}

impl ValueBetRecord {
    /// Total number of qualifying conditions in the record.
    #[must_use]
    pub fn bet_count(&self) -> usize {
        self.markets.values().map(ValueNode::bet_count).sum()
    }

    /// Whether the record still carries at least one market branch.
    #[must_use]
    pub fn has_markets(&self) -> bool {
        !self.markets.is_empty()
    }
}
