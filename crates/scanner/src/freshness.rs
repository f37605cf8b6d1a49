//! Staleness and kickoff rules applied before a pair is compared.
//!
//! Scrapers keep writing snapshots long after a match disappears from a
//! bookmaker's offer, so old data must not be mistaken for live pricing.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use valuebet_core::FreshnessConfig;
use valuebet_data::EventRecord;

/// Decides which records are current enough to be scanned.
#[derive(Debug, Clone, Default)]
pub struct FreshnessPolicy {
    config: FreshnessConfig,
}

impl FreshnessPolicy {
    #[must_use]
    pub fn new(config: FreshnessConfig) -> Self {
        Self { config }
    }

    /// Whether a match dated today starts too soon to be bet on.
    ///
    /// A kickoff that cannot be parsed counts as passed. Matches on other
    /// days are never filtered, and the filter is off without a grace.
    #[must_use]
    pub fn kickoff_passed(&self, record: &EventRecord, now: NaiveDateTime) -> bool {
        let Some(grace) = self.config.kickoff_grace_minutes else {
            return false;
        };
        if record.event_date() != Some(now.date()) {
            return false;
        }
        let Some(kickoff) = record.kickoff() else {
            return true;
        };

        let cutoff = now + Duration::minutes(grace);
        if cutoff.date() > now.date() {
            return true;
        }

        // kickoffs only carry minutes
        let cutoff = cutoff.time().with_second(0).and_then(|t| t.with_nanosecond(0));
        cutoff.map_or(true, |cutoff| cutoff > kickoff)
    }

    /// Modification time a record must be newer than.
    ///
    /// Pinned to midnight during the early-morning window and whenever the
    /// staleness window reaches back into yesterday.
    #[must_use]
    pub fn reference_time(&self, now: NaiveDateTime) -> NaiveTime {
        let since_midnight = i64::from(now.time().num_seconds_from_midnight()) / 60;
        if since_midnight < self.config.early_morning_window_minutes {
            return NaiveTime::MIN;
        }

        let threshold = now - Duration::minutes(self.config.stale_after_minutes);
        if threshold.date() < now.date() {
            NaiveTime::MIN
        } else {
            threshold.time()
        }
    }

    /// Whether a record was modified today and after the reference time.
    #[must_use]
    pub fn is_fresh(&self, record: &EventRecord, now: NaiveDateTime) -> bool {
        let (Some(date), Some(time)) = (record.modified_date(), record.modified_time()) else {
            return false;
        };
        date >= now.date() && time > self.reference_time(now)
    }

    /// Both sides of a pair must be fresh.
    #[must_use]
    pub fn pair_is_fresh(&self, reference: &EventRecord, other: &EventRecord, now: NaiveDateTime) -> bool {
        self.is_fresh(reference, now) && self.is_fresh(other, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use valuebet_data::MarketTree;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(date: &str, kickoff: &str, modified_date: &str, modified_time: &str) -> EventRecord {
        EventRecord {
            id: "p1".to_string(),
            bookmaker_name: "Pinnacle".to_string(),
            sport_name: "football".to_string(),
            competition: "Spain La Liga".to_string(),
            teams: ["Sevilla".to_string(), "Betis".to_string()],
            date: date.to_string(),
            time: kickoff.to_string(),
            is_live: false,
            last_modified_date: modified_date.to_string(),
            last_modified_time: modified_time.to_string(),
            markets: MarketTree::new(),
        }
    }

    #[test]
    fn test_kickoff_within_grace_is_passed() {
        let policy = FreshnessPolicy::default();
        let now = at(12, 0, 0);

        assert!(policy.kickoff_passed(&record("19/10/26", "13:30", "19/10/26", "11:59:00"), now));
        assert!(!policy.kickoff_passed(&record("19/10/26", "14:00", "19/10/26", "11:59:00"), now));
        assert!(!policy.kickoff_passed(&record("19/10/26", "18:00", "19/10/26", "11:59:00"), now));
    }

    #[test]
    fn test_kickoff_other_day_never_passed() {
        let policy = FreshnessPolicy::default();
        let now = at(23, 0, 0);
        assert!(!policy.kickoff_passed(&record("20/10/26", "00:30", "19/10/26", "22:59:00"), now));
    }

    #[test]
    fn test_kickoff_cutoff_past_midnight() {
        let policy = FreshnessPolicy::default();
        let now = at(22, 30, 0);
        assert!(policy.kickoff_passed(&record("19/10/26", "23:59", "19/10/26", "22:00:00"), now));
    }

    #[test]
    fn test_kickoff_unparseable() {
        let policy = FreshnessPolicy::default();
        assert!(policy.kickoff_passed(&record("19/10/26", "TBC", "19/10/26", "11:59:00"), at(12, 0, 0)));
    }

    #[test]
    fn test_kickoff_filter_disabled_without_grace() {
        let policy = FreshnessPolicy::new(FreshnessConfig {
            kickoff_grace_minutes: None,
            ..FreshnessConfig::default()
        });
        assert!(!policy.kickoff_passed(&record("19/10/26", "11:00", "19/10/26", "11:59:00"), at(12, 0, 0)));
    }

    #[test]
    fn test_reference_time() {
        let policy = FreshnessPolicy::default();

        assert_eq!(policy.reference_time(at(0, 30, 0)), NaiveTime::MIN);
        assert_eq!(policy.reference_time(at(1, 0, 0)), NaiveTime::MIN);
        assert_eq!(
            policy.reference_time(at(14, 20, 5)),
            NaiveTime::from_hms_opt(13, 20, 5).unwrap()
        );
    }

    #[test]
    fn test_reference_time_short_window() {
        let policy = FreshnessPolicy::new(FreshnessConfig {
            early_morning_window_minutes: 10,
            ..FreshnessConfig::default()
        });
        // past the window but an hour back is still yesterday
        assert_eq!(policy.reference_time(at(0, 30, 0)), NaiveTime::MIN);
    }

    #[test]
    fn test_is_fresh() {
        let policy = FreshnessPolicy::default();
        let now = at(14, 0, 0);

        assert!(policy.is_fresh(&record("19/10/26", "20:00", "19/10/26", "13:30:00"), now));
        assert!(!policy.is_fresh(&record("19/10/26", "20:00", "19/10/26", "12:59:59"), now));
        assert!(!policy.is_fresh(&record("19/10/26", "20:00", "18/10/26", "13:30:00"), now));
        assert!(!policy.is_fresh(&record("19/10/26", "20:00", "19/10/26", "garbage"), now));
    }

    #[test]
    fn test_pair_requires_both_sides() {
        let policy = FreshnessPolicy::default();
        let now = at(14, 0, 0);
        let fresh = record("19/10/26", "20:00", "19/10/26", "13:30:00");
        let stale = record("19/10/26", "20:00", "19/10/26", "09:00:00");

        assert!(policy.pair_is_fresh(&fresh, &fresh, now));
        assert!(!policy.pair_is_fresh(&fresh, &stale, now));
        assert!(!policy.pair_is_fresh(&stale, &fresh, now));
    }
}
