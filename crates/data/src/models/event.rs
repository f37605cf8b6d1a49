//! Bookmaker event snapshot model.
//!
//! One scraped record per bookmaker, match and date. Timestamps are kept as
//! the scrapers write them and parsed on demand.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format used by every source collection (`19/10/26`).
pub const DATE_FORMAT: &str = "%d/%m/%y";
/// Kickoff time format (`19:45`).
pub const KICKOFF_FORMAT: &str = "%H:%M";
/// Wall clock format for modification and creation times (`19:45:03`).
pub const CLOCK_FORMAT: &str = "%H:%M:%S";

/// Market tree shared by event records.
pub type MarketTree = BTreeMap<String, MarketNode>;

/// A node of a bookmaker's market tree.
///
/// Serialized untagged so stored documents keep their plain JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarketNode {
    /// Decimal odds for each outcome of one market, in condition order.
    Market(Vec<Decimal>),
    /// Grouped markets, e.g. all over/under lines.
    Group(BTreeMap<String, MarketNode>),
    /// Anything else a scraper stored under the market root.
    Opaque(serde_json::Value),
}

impl MarketNode {
    #[must_use]
    pub fn as_market(&self) -> Option<&[Decimal]> {
        match self {
            Self::Market(odds) => Some(odds),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&BTreeMap<String, MarketNode>> {
        match self {
            Self::Group(children) => Some(children),
            _ => None,
        }
    }
}

/// One bookmaker's snapshot of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique per bookmaker, match and date.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub bookmaker_name: String,
    #[serde(default)]
    pub sport_name: String,
    pub competition: String,
    pub teams: [String; 2],
    /// Match date, `dd/mm/yy`.
    pub date: String,
    /// Kickoff, `HH:MM`.
    pub time: String,
    #[serde(default)]
    pub is_live: bool,
    /// `dd/mm/yy`
    pub last_modified_date: String,
    /// `HH:MM:SS`
    pub last_modified_time: String,
    #[serde(default)]
    pub markets: MarketTree,
}

impl EventRecord {
    /// `"home vs away"` as shown to users and used for fuzzy matching.
    #[must_use]
    pub fn fixture(&self) -> String {
        format!("{} vs {}", self.teams[0], self.teams[1])
    }

    #[must_use]
    pub fn event_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    #[must_use]
    pub fn kickoff(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, KICKOFF_FORMAT).ok()
    }

    #[must_use]
    pub fn modified_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.last_modified_date, DATE_FORMAT).ok()
    }

    #[must_use]
    pub fn modified_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.last_modified_time, CLOCK_FORMAT).ok()
    }
}
