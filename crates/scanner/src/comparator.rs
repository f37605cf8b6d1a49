//! Market comparison between a reference book and another book.
//!
//! The reference side is expected to be de-vigged already, so each of its
//! prices is a fair price. A condition qualifies as a value bet when the
//! other book pays enough above that fair price, inside a band of
//! plausible prices:
//!
//! ```text
//! other >= reference + min_gap
//! other >= min_other_odds
//! reference <= max_reference_odds
//! ((other / reference) - 1) * 100 <= max_roi_pct
//! ```

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::trace;
use valuebet_core::{ScannerConfig, ThresholdConfig};
use valuebet_data::models::{CLOCK_FORMAT, DATE_FORMAT};
use valuebet_data::{EventRecord, MarketNode, MarketTree, ValueBetEntry, ValueBetRecord, ValueNode, ValueTree};

/// Deterministic identifier of a value bet.
///
/// Re-deriving the same discrepancy always yields the same id, which is
/// what makes upserts idempotent across passes.
#[must_use]
pub fn value_bet_id(reference_id: &str, reference_bookmaker: &str, other_bookmaker: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference_id.as_bytes());
    hasher.update(reference_bookmaker.as_bytes());
    hasher.update(other_bookmaker.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares market trees and assembles value bet records.
#[derive(Debug, Clone)]
pub struct MarketComparator {
    thresholds: ThresholdConfig,
    excluded: HashSet<String>,
}

impl Default for MarketComparator {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl MarketComparator {
    #[must_use]
    pub fn new(thresholds: ThresholdConfig, excluded: impl IntoIterator<Item = String>) -> Self {
        Self {
            thresholds,
            excluded: excluded.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.thresholds.clone(), config.excluded_markets.iter().cloned())
    }

    #[must_use]
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded.contains(key)
    }

    /// Applies the price rules to one condition.
    ///
    /// `reference` is the fair price, `other` the offered price.
    #[must_use]
    pub fn compare_condition(&self, condition: usize, reference: Decimal, other: Decimal) -> Option<ValueBetEntry> {
        let t = &self.thresholds;

        if reference <= Decimal::ZERO {
            return None;
        }
        if other < reference + t.min_gap || other < t.min_other_odds || reference > t.max_reference_odds {
            return None;
        }

        let roi_pct = (other.checked_div(reference)? - Decimal::ONE) * dec!(100);
        if roi_pct > t.max_roi_pct {
            trace!(condition, %reference, %other, %roi_pct, "ROI above ceiling, ignoring");
            return None;
        }

        Some(ValueBetEntry {
            condition,
            reference_odds: reference.round_dp(4),
            other_odds: other,
            roi_pct: roi_pct.round_dp(4),
        })
    }

    /// Compares two price lists of the same market.
    ///
    /// Lists of different length describe different markets and are marked
    /// [`ValueNode::Unusable`].
    #[must_use]
    pub fn compare_market(&self, reference: &[Decimal], other: &[Decimal]) -> ValueNode {
        if reference.len() != other.len() {
            return ValueNode::Unusable;
        }

        let entries = reference
            .iter()
            .zip(other)
            .enumerate()
            .filter_map(|(i, (&a, &b))| self.compare_condition(i, a, b))
            .collect();

        ValueNode::Bets(entries)
    }

    /// Compares two aligned market trees.
    ///
    /// Excluded keys, non-price leaves and keys whose node kinds differ
    /// between the sides are skipped.
    #[must_use]
    pub fn compare_tree(&self, reference: &MarketTree, other: &MarketTree) -> ValueTree {
        let mut out = ValueTree::new();

        for (key, ref_node) in reference {
            if self.is_excluded(key) {
                continue;
            }
            let Some(other_node) = other.get(key) else {
                continue;
            };

            let node = match (ref_node, other_node) {
                (MarketNode::Market(a), MarketNode::Market(b)) => self.compare_market(a, b),
                (MarketNode::Group(a), MarketNode::Group(b)) => ValueNode::Group(self.compare_tree(a, b)),
                _ => continue,
            };
            out.insert(key.clone(), node);
        }

        out
    }

    /// Builds the value bet record for a matched pair.
    ///
    /// `reference` must carry de-vigged markets and both records must have
    /// been equalized. The result is not pruned.
    #[must_use]
    pub fn compare_records(&self, reference: &EventRecord, other: &EventRecord, now: NaiveDateTime) -> ValueBetRecord {
        let value_bet_age = match (reference.modified_time(), other.modified_time()) {
            (Some(a), Some(b)) => Some(a.min(b).format(CLOCK_FORMAT).to_string()),
            _ => None,
        };

        ValueBetRecord {
            id: value_bet_id(&reference.id, &reference.bookmaker_name, &other.bookmaker_name),
            bookmaker_name: format!("{} - {}", reference.bookmaker_name, other.bookmaker_name),
            match_id: format!("{} - {}", reference.id, other.id),
            teams: format!("{} - {}", reference.fixture(), other.fixture()),
            sport_name: reference.sport_name.clone(),
            competition: reference.competition.clone(),
            event_date: reference.date.clone(),
            date: format!("{} | {}", reference.date, other.date),
            time: format!("{} | {}", reference.time, other.time),
            is_live: reference.is_live,
            created_date: now.format(DATE_FORMAT).to_string(),
            created_time: now.format(CLOCK_FORMAT).to_string(),
            value_bet_age,
            markets: self.compare_tree(&reference.markets, &other.markets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn comparator() -> MarketComparator {
        MarketComparator::default()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn record(id: &str, bookmaker: &str, home: &str, away: &str, modified: &str, markets: MarketTree) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            bookmaker_name: bookmaker.to_string(),
            sport_name: "football".to_string(),
            competition: "England Premier League".to_string(),
            teams: [home.to_string(), away.to_string()],
            date: "19/10/26".to_string(),
            time: "19:45".to_string(),
            is_live: false,
            last_modified_date: "19/10/26".to_string(),
            last_modified_time: modified.to_string(),
            markets,
        }
    }

    #[test]
    fn test_gap_below_minimum() {
        assert!(comparator().compare_condition(0, dec!(2.0), dec!(2.01)).is_none());
    }

    #[test]
    fn test_gap_bound_is_inclusive() {
        let entry = comparator().compare_condition(0, dec!(2.0), dec!(2.02)).unwrap();
        assert_eq!(entry.roi_pct, dec!(1));
    }

    #[test]
    fn test_qualifying_condition() {
        let entry = comparator().compare_condition(2, dec!(2.0), dec!(2.10)).unwrap();
        assert_eq!(entry.condition, 2);
        assert_eq!(entry.reference_odds, dec!(2.0));
        assert_eq!(entry.other_odds, dec!(2.10));
        assert_eq!(entry.roi_display(), "5.0%");
    }

    #[test]
    fn test_reference_above_ceiling() {
        assert!(comparator().compare_condition(0, dec!(2.4), dec!(2.6)).is_none());
    }

    #[test]
    fn test_other_below_floor() {
        assert!(comparator().compare_condition(0, dec!(1.5), dec!(1.6)).is_none());
        assert!(comparator().compare_condition(0, dec!(1.6), dec!(1.7)).is_some());
    }

    #[test]
    fn test_roi_ceiling() {
        // 2.24 / 2.0 = 12% exactly, still accepted
        assert!(comparator().compare_condition(0, dec!(2.0), dec!(2.24)).is_some());
        assert!(comparator().compare_condition(0, dec!(2.0), dec!(2.25)).is_none());
    }

    #[test]
    fn test_market_length_mismatch_is_unusable() {
        let node = comparator().compare_market(&[dec!(2.0), dec!(1.9)], &[dec!(2.1), dec!(1.9), dec!(3.0)]);
        assert_eq!(node, ValueNode::Unusable);
    }

    #[test]
    fn test_compare_tree_recurses_and_skips() {
        let mut ref_totals = BTreeMap::new();
        ref_totals.insert("2.5".to_string(), MarketNode::Market(vec![dec!(2.0), dec!(2.0)]));
        let mut other_totals = BTreeMap::new();
        other_totals.insert("2.5".to_string(), MarketNode::Market(vec![dec!(2.1), dec!(1.8)]));

        let mut reference = MarketTree::new();
        reference.insert("Total".to_string(), MarketNode::Group(ref_totals));
        reference.insert("Correct Score".to_string(), MarketNode::Market(vec![dec!(2.0)]));
        reference.insert("1X2".to_string(), MarketNode::Market(vec![dec!(2.0), dec!(3.0), dec!(4.0)]));
        reference.insert("Handicap".to_string(), MarketNode::Market(vec![dec!(2.0), dec!(2.0)]));

        let mut other = MarketTree::new();
        other.insert("Total".to_string(), MarketNode::Group(other_totals));
        other.insert("Correct Score".to_string(), MarketNode::Market(vec![dec!(2.2)]));
        other.insert("1X2".to_string(), MarketNode::Market(vec![dec!(2.1), dec!(3.0)]));
        other.insert("Handicap".to_string(), MarketNode::Group(BTreeMap::new()));

        let tree = comparator().compare_tree(&reference, &other);

        assert!(!tree.contains_key("Correct Score"));
        assert!(!tree.contains_key("Handicap"));
        assert_eq!(tree["1X2"], ValueNode::Unusable);

        let ValueNode::Group(totals) = &tree["Total"] else {
            panic!("expected group");
        };
        let ValueNode::Bets(entries) = &totals["2.5"] else {
            panic!("expected bets");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].condition, 0);
    }

    #[test]
    fn test_value_bet_id_is_deterministic() {
        let a = value_bet_id("p1", "Pinnacle", "Stake");
        let b = value_bet_id("p1", "Pinnacle", "Stake");
        let c = value_bet_id("p1", "Pinnacle", "1xBet");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_compare_records_assembly() {
        let mut ref_markets = MarketTree::new();
        ref_markets.insert("Moneyline".to_string(), MarketNode::Market(vec![dec!(2.0), dec!(2.0)]));
        let mut other_markets = MarketTree::new();
        other_markets.insert("Moneyline".to_string(), MarketNode::Market(vec![dec!(2.1), dec!(1.8)]));

        let reference = record("p1", "Pinnacle", "Arsenal", "Chelsea", "11:40:00", ref_markets);
        let other = record("s1", "Stake", "Arsenal FC", "Chelsea", "11:35:10", other_markets);

        let out = comparator().compare_records(&reference, &other, now());

        assert_eq!(out.id, value_bet_id("p1", "Pinnacle", "Stake"));
        assert_eq!(out.bookmaker_name, "Pinnacle - Stake");
        assert_eq!(out.match_id, "p1 - s1");
        assert_eq!(out.teams, "Arsenal vs Chelsea - Arsenal FC vs Chelsea");
        assert_eq!(out.date, "19/10/26 | 19/10/26");
        assert_eq!(out.time, "19:45 | 19:45");
        assert_eq!(out.event_date, "19/10/26");
        assert_eq!(out.created_date, "19/10/26");
        assert_eq!(out.created_time, "12:00:00");
        assert_eq!(out.value_bet_age.as_deref(), Some("11:35:10"));
        assert_eq!(out.bet_count(), 1);
    }

    #[test]
    fn test_age_missing_when_unparseable() {
        let reference = record("p1", "Pinnacle", "A", "B", "soon", MarketTree::new());
        let other = record("s1", "Stake", "A", "B", "11:35:10", MarketTree::new());

        let out = comparator().compare_records(&reference, &other, now());
        assert!(out.value_bet_age.is_none());
        assert!(!out.has_markets());
    }
}
