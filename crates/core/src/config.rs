use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/bookie_markets".to_string(),
            max_connections: 10,
        }
    }
}

/// Which feed family a scanner instance works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Pre-match odds, scanned over a multi-day horizon.
    #[default]
    Line,
    /// In-play odds, scanned for today only.
    Live,
}

impl ScanMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Live => "live",
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Two source collections scanned against each other.
///
/// `reference` is the sharp book: its odds are de-vigged and treated as the
/// fair price that `other` is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePairConfig {
    pub reference: String,
    pub other: String,
}

impl SourcePairConfig {
    #[must_use]
    pub fn new(reference: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            other: other.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.reference, self.other)
    }
}

/// Price rules a single condition must satisfy to count as a value bet.
///
/// All bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum absolute gap between the other price and the fair price.
    pub min_gap: Decimal,
    /// Lowest price accepted on the other side.
    pub min_other_odds: Decimal,
    /// Highest fair price accepted on the reference side.
    pub max_reference_odds: Decimal,
    /// ROI ceiling in percent; anything above is treated as bad data.
    pub max_roi_pct: Decimal,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_gap: dec!(0.02),
            min_other_odds: dec!(1.7),
            max_reference_odds: dec!(2.3),
            max_roi_pct: dec!(12),
        }
    }
}

/// Staleness rules applied before a pair of records is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Matches kicking off sooner than this are skipped. `None` disables
    /// the kickoff filter (in-play scanning).
    pub kickoff_grace_minutes: Option<i64>,
    /// Scraped data older than this is not treated as live pricing.
    pub stale_after_minutes: i64,
    /// Length of the window after midnight during which the staleness
    /// reference time is pinned to 00:00:00.
    pub early_morning_window_minutes: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            kickoff_grace_minutes: Some(120),
            stale_after_minutes: 60,
            early_morning_window_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub mode: ScanMode,
    pub pairs: Vec<SourcePairConfig>,
    /// Collection the derived value bets are written to.
    pub value_bet_collection: String,
    pub competitions: Vec<String>,
    /// Upper bound on concurrently running shards.
    pub max_workers: usize,
    /// Days scanned starting today. Ignored in live mode.
    pub day_horizon: u32,
    pub pass_timeout_secs: u64,
    /// Pause between two passes of the run loop.
    pub pass_interval_ms: u64,
    /// A candidate scoring at least this much ends the match search early.
    pub match_early_exit_score: u32,
    /// Market keys never compared (combinatorial or non-price markets).
    pub excluded_markets: Vec<String>,
    pub thresholds: ThresholdConfig,
    pub freshness: FreshnessConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::line()
    }
}

impl ScannerConfig {
    /// Pre-match scanning over three days.
    #[must_use]
    pub fn line() -> Self {
        Self {
            mode: ScanMode::Line,
            pairs: vec![
                SourcePairConfig::new("pinnacle_line_football", "xbet_line_football"),
                SourcePairConfig::new("pinnacle_line_football", "stake_line_football"),
                SourcePairConfig::new("pinnacle_line_football", "megapari_line_football"),
            ],
            value_bet_collection: "football_line_value_bets".to_string(),
            competitions: default_competitions(),
            max_workers: 8,
            day_horizon: 3,
            pass_timeout_secs: 600,
            pass_interval_ms: 1_000,
            match_early_exit_score: 99,
            excluded_markets: vec![
                "Correct Score".to_string(),
                "HT-FT".to_string(),
                "teams".to_string(),
            ],
            thresholds: ThresholdConfig::default(),
            freshness: FreshnessConfig::default(),
        }
    }

    /// In-play scanning: today only, no kickoff filter.
    #[must_use]
    pub fn live() -> Self {
        Self {
            mode: ScanMode::Live,
            pairs: vec![
                SourcePairConfig::new("pinnacle_live_football", "xbet_live_football"),
                SourcePairConfig::new("pinnacle_live_football", "stake_live_football"),
            ],
            value_bet_collection: "football_live_value_bets".to_string(),
            day_horizon: 1,
            freshness: FreshnessConfig {
                kickoff_grace_minutes: None,
                ..FreshnessConfig::default()
            },
            ..Self::line()
        }
    }

    /// Number of days a pass fans out over.
    #[must_use]
    pub fn effective_day_horizon(&self) -> u32 {
        match self.mode {
            ScanMode::Live => 1,
            ScanMode::Line => self.day_horizon.max(1),
        }
    }

    /// Freshness rules for this mode; in-play scanning has no kickoff filter.
    #[must_use]
    pub fn effective_freshness(&self) -> FreshnessConfig {
        match self.mode {
            ScanMode::Live => FreshnessConfig {
                kickoff_grace_minutes: None,
                ..self.freshness.clone()
            },
            ScanMode::Line => self.freshness.clone(),
        }
    }

    #[must_use]
    pub fn with_competitions(mut self, competitions: Vec<String>) -> Self {
        self.competitions = competitions;
        self
    }

    #[must_use]
    pub fn with_pairs(mut self, pairs: Vec<SourcePairConfig>) -> Self {
        self.pairs = pairs;
        self
    }

    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    #[must_use]
    pub fn with_day_horizon(mut self, days: u32) -> Self {
        self.day_horizon = days;
        self
    }
}

fn default_competitions() -> Vec<String> {
    [
        "England Premier League",
        "England Championship",
        "Germany Bundesliga",
        "Germany Bundesliga 2",
        "France League 1",
        "Spain La Liga",
        "Italy Serie A",
        "Netherlands Eredivisie",
        "Portugal Primeira Liga",
        "UEFA Champions League",
        "UEFA Europa League",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_preset_scans_single_day() {
        let config = ScannerConfig::live().with_day_horizon(5);
        assert_eq!(config.effective_day_horizon(), 1);
        assert!(config.freshness.kickoff_grace_minutes.is_none());
    }

    #[test]
    fn test_live_mode_disables_kickoff_filter() {
        let config = ScannerConfig {
            mode: ScanMode::Live,
            ..ScannerConfig::line()
        };
        assert_eq!(config.freshness.kickoff_grace_minutes, Some(120));
        assert!(config.effective_freshness().kickoff_grace_minutes.is_none());
        assert_eq!(
            ScannerConfig::line().effective_freshness().kickoff_grace_minutes,
            Some(120)
        );
    }

    #[test]
    fn test_line_horizon_never_zero() {
        let config = ScannerConfig::line().with_day_horizon(0);
        assert_eq!(config.effective_day_horizon(), 1);
    }

    #[test]
    fn test_default_thresholds() {
        let t = ThresholdConfig::default();
        assert_eq!(t.min_gap, dec!(0.02));
        assert_eq!(t.min_other_odds, dec!(1.7));
        assert_eq!(t.max_reference_odds, dec!(2.3));
        assert_eq!(t.max_roi_pct, dec!(12));
    }

    #[test]
    fn test_scan_mode_serde() {
        let json = serde_json::to_string(&ScanMode::Live).unwrap();
        assert_eq!(json, "\"live\"");
        let mode: ScanMode = serde_json::from_str("\"line\"").unwrap();
        assert_eq!(mode, ScanMode::Line);
    }

    #[test]
    fn test_pair_label() {
        let pair = SourcePairConfig::new("pinnacle", "stake");
        assert_eq!(pair.label(), "pinnacle/stake");
    }
}
