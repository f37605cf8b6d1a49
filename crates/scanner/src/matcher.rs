//! Event matching across bookmakers.
//!
//! Two scrapers rarely spell a fixture the same way ("Man Utd vs Spurs" vs
//! "Manchester United vs Tottenham"), so records are paired on a fuzzy,
//! token-order-independent similarity of their fixtures.
//!
//! Candidates are expected to be pre-filtered to the same date and
//! competition, which keeps lists short and false positives rare.

use tracing::trace;
use valuebet_data::EventRecord;

// =============================================================================
// Match Configuration
// =============================================================================

/// Configuration for event matching.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// A candidate scoring at least this (0..=100) ends the search.
    pub early_exit_score: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            early_exit_score: 99,
        }
    }
}

impl MatchConfig {
    /// Sets the early-exit score.
    #[must_use]
    pub fn with_early_exit_score(mut self, score: u32) -> Self {
        self.early_exit_score = score;
        self
    }
}

// =============================================================================
// Similarity
// =============================================================================

/// Lower-cases, blanks out punctuation, then sorts the whitespace-separated
/// tokens and joins them back.
fn token_sorted(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Token-order-independent similarity between two strings, 0..=100.
///
/// Identical strings (ignoring case, punctuation and token order) score 100.
#[must_use]
pub fn token_sort_similarity(a: &str, b: &str) -> u32 {
    let score = strsim::normalized_levenshtein(&token_sorted(a), &token_sorted(b));
    // normalized_levenshtein is within 0.0..=1.0
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = (score * 100.0).round() as u32;
    score
}

// =============================================================================
// Event Matcher
// =============================================================================

/// Finds the counterpart of an event in another bookmaker's records.
#[derive(Debug, Clone, Default)]
pub struct EventMatcher {
    config: MatchConfig,
}

impl EventMatcher {
    /// Creates a new matcher with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new matcher with custom configuration.
    #[must_use]
    pub fn with_config(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Similarity of two events' fixtures.
    #[must_use]
    pub fn score(&self, a: &EventRecord, b: &EventRecord) -> u32 {
        token_sort_similarity(&a.fixture(), &b.fixture())
    }

    /// Returns the best-scoring candidate for `target`.
    ///
    /// Ties go to the candidate seen first. A candidate must score above
    /// zero to be chosen; there is no other threshold here, implausible
    /// pairs are left to the freshness checks and price bounds downstream.
    #[must_use]
    pub fn find_match<'a>(
        &self,
        target: &EventRecord,
        candidates: &'a [EventRecord],
    ) -> Option<&'a EventRecord> {
        let mut best: Option<&'a EventRecord> = None;
        let mut best_score = 0;

        for candidate in candidates {
            let score = self.score(target, candidate);
            if score > best_score {
                best_score = score;
                best = Some(candidate);
            }
            if best_score >= self.config.early_exit_score {
                break;
            }
        }

        if let Some(found) = best {
            trace!(
                target = %target.fixture(),
                matched = %found.fixture(),
                score = best_score,
                "Resolved event match"
            );
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuebet_data::MarketTree;

    fn event(id: &str, home: &str, away: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            bookmaker_name: "Stake".to_string(),
            sport_name: "football".to_string(),
            competition: "England Premier League".to_string(),
            teams: [home.to_string(), away.to_string()],
            date: "19/10/26".to_string(),
            time: "19:45".to_string(),
            is_live: false,
            last_modified_date: "19/10/26".to_string(),
            last_modified_time: "11:30:00".to_string(),
            markets: MarketTree::new(),
        }
    }

    #[test]
    fn test_identical_strings_score_max() {
        assert_eq!(token_sort_similarity("Arsenal vs Chelsea", "Arsenal vs Chelsea"), 100);
        assert_eq!(token_sort_similarity("ARSENAL vs chelsea", "arsenal VS Chelsea"), 100);
    }

    #[test]
    fn test_token_order_ignored() {
        assert_eq!(token_sort_similarity("Chelsea vs Arsenal", "Arsenal vs Chelsea"), 100);
    }

    #[test]
    fn test_punctuation_ignored() {
        assert_eq!(token_sort_similarity("Man. Utd vs Spurs", "Man Utd vs Spurs"), 100);
        assert_eq!(token_sort_similarity("Paris S-G vs Lens", "Paris S G vs Lens"), 100);
    }

    #[test]
    fn test_similar_beats_dissimilar() {
        let close = token_sort_similarity("Manchester United vs Tottenham", "Manchester Utd vs Tottenham");
        let far = token_sort_similarity("Manchester United vs Tottenham", "Everton vs Brentford");
        assert!(close > far);
        assert!(close < 100);
    }

    #[test]
    fn test_exact_duplicate_chosen() {
        let matcher = EventMatcher::new();
        let target = event("p1", "Arsenal", "Chelsea");
        let candidates = vec![
            event("s1", "Everton", "Brentford"),
            event("s2", "Arsenal", "Chelsea"),
            event("s3", "Arsenal FC", "Chelsea FC"),
        ];

        let found = matcher.find_match(&target, &candidates).unwrap();
        assert_eq!(found.id, "s2");
        assert_eq!(matcher.score(&target, found), 100);
    }

    #[test]
    fn test_empty_candidates() {
        let matcher = EventMatcher::new();
        let target = event("p1", "Arsenal", "Chelsea");
        assert!(matcher.find_match(&target, &[]).is_none());
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let matcher = EventMatcher::new();
        let target = event("p1", "Arsenal", "Chelsea");
        let candidates = vec![
            event("s1", "Arsenal", "Chelsea"),
            event("s2", "Arsenal", "Chelsea"),
        ];
        assert_eq!(matcher.find_match(&target, &candidates).unwrap().id, "s1");

        let strict = EventMatcher::with_config(MatchConfig::default().with_early_exit_score(101));
        assert_eq!(strict.find_match(&target, &candidates).unwrap().id, "s1");
    }

    #[test]
    fn test_best_candidate_without_early_exit() {
        let matcher = EventMatcher::new();
        let target = event("p1", "Manchester United", "Tottenham");
        let candidates = vec![
            event("s1", "Everton", "Brentford"),
            event("s2", "Manchester Utd", "Tottenham"),
            event("s3", "Newcastle", "Fulham"),
        ];
        assert_eq!(matcher.find_match(&target, &candidates).unwrap().id, "s2");
    }

    #[test]
    fn test_early_exit_stops_before_better_candidate() {
        let target = event("p1", "Arsenal", "Chelsea");
        let candidates = vec![
            event("s1", "Arsenal FC", "Chelsea FC"),
            event("s2", "Arsenal", "Chelsea"),
        ];

        let eager = EventMatcher::with_config(MatchConfig::default().with_early_exit_score(50));
        let found = eager.find_match(&target, &candidates).unwrap();
        assert_eq!(found.id, "s1");
        assert!(eager.score(&target, found) < 100);

        assert_eq!(EventMatcher::new().find_match(&target, &candidates).unwrap().id, "s2");
    }
}
