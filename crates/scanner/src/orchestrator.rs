//! Sharded scan passes and reconciliation of stored value bets.
//!
//! A pass fans out over bookmaker pairs, days and chunks of the competition
//! list. Each shard fetches both sides, pairs up events, derives value bets
//! and upserts them. Shard results are folded into a pass-local
//! accumulator at join points; once every shard has finished (or the pass
//! timed out) stored value bets that were not re-derived are swept.
//!
//! Sweeping never removes what a failed shard could not re-derive: the
//! stored ids in the scope of a failed, panicked or aborted shard are kept,
//! as are ids whose write was not confirmed.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};
use valuebet_core::ScannerConfig;
use valuebet_data::models::DATE_FORMAT;
use valuebet_data::{EventRecord, EventSource, ValueBetRecord, ValueBetStore};

use crate::comparator::MarketComparator;
use crate::equalizer::equalize;
use crate::error::ScanError;
use crate::freshness::FreshnessPolicy;
use crate::matcher::{EventMatcher, MatchConfig};
use crate::normalizer::normalize_tree;
use crate::pruner::prune_record;

// =============================================================================
// Pass Types
// =============================================================================

/// Two source collections scanned against each other.
#[derive(Clone)]
pub struct SourcePair {
    /// Sharp book; its prices are de-vigged and used as fair prices.
    pub reference: Arc<dyn EventSource>,
    pub other: Arc<dyn EventSource>,
}

impl SourcePair {
    #[must_use]
    pub fn new(reference: Arc<dyn EventSource>, other: Arc<dyn EventSource>) -> Self {
        Self { reference, other }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.reference.name(), self.other.name())
    }
}

impl fmt::Debug for SourcePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePair")
            .field("reference", &self.reference.name())
            .field("other", &self.other.name())
            .finish()
    }
}

/// Date and competition a shard worked on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanScope {
    pub event_date: String,
    pub competition: String,
}

/// One unit of fan-out: a pair, a day and a chunk of competitions.
#[derive(Debug, Clone)]
pub struct ShardPlan {
    pub index: usize,
    pub pair_index: usize,
    pub date: String,
    pub competitions: Vec<String>,
}

impl ShardPlan {
    fn scopes(&self) -> impl Iterator<Item = ScanScope> + '_ {
        self.competitions.iter().map(|competition| ScanScope {
            event_date: self.date.clone(),
            competition: competition.clone(),
        })
    }
}

/// What one shard produced.
#[derive(Debug, Default)]
struct ShardOutcome {
    produced: Vec<String>,
    failed_writes: Vec<String>,
    failed_scopes: Vec<ScanScope>,
}

/// Result of one full pass.
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    /// Distinct value bets confirmed written.
    pub produced: usize,
    /// Stored value bets removed by the sweep.
    pub deleted: u64,
    /// Shards with at least one failed fetch, or that panicked.
    pub failed_shards: usize,
    /// Shards aborted at the pass timeout.
    pub timed_out_shards: usize,
    /// The sweep did not run because a failed scope could not be protected.
    pub sweep_skipped: bool,
    pub duration: Duration,
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "produced={} deleted={} failed_shards={} timed_out_shards={} sweep_skipped={} duration={}ms",
            self.produced,
            self.deleted,
            self.failed_shards,
            self.timed_out_shards,
            self.sweep_skipped,
            self.duration.as_millis()
        )
    }
}

// =============================================================================
// Pass Accumulator
// =============================================================================

/// Pass-local fold of shard outcomes.
#[derive(Debug, Default)]
struct PassAccumulator {
    produced: HashSet<String>,
    failed_writes: HashSet<String>,
    protected_scopes: BTreeSet<ScanScope>,
    failed_shards: usize,
    timed_out_shards: usize,
}

impl PassAccumulator {
    fn absorb(&mut self, outcome: ShardOutcome) {
        if !outcome.failed_scopes.is_empty() {
            self.failed_shards += 1;
        }
        self.produced.extend(outcome.produced);
        self.failed_writes.extend(outcome.failed_writes);
        self.protected_scopes.extend(outcome.failed_scopes);
    }

    fn protect_shard(&mut self, plan: &ShardPlan) {
        self.protected_scopes.extend(plan.scopes());
    }

    /// Ids the sweep must keep, or an error if a scope could not be read.
    async fn keep_set(&self, store: &dyn ValueBetStore) -> Result<HashSet<String>, ScanError> {
        let mut keep: HashSet<String> = self.produced.union(&self.failed_writes).cloned().collect();

        for scope in &self.protected_scopes {
            let ids = store
                .ids_in_scope(&scope.event_date, &scope.competition)
                .await
                .map_err(|source| ScanError::Protect {
                    date: scope.event_date.clone(),
                    competition: scope.competition.clone(),
                    source,
                })?;
            trace!(
                date = %scope.event_date,
                competition = %scope.competition,
                protected = ids.len(),
                "Protected scope from sweep"
            );
            keep.extend(ids);
        }

        Ok(keep)
    }
}

// =============================================================================
// Scan Context
// =============================================================================

/// Everything a shard needs, shared read-only across tasks.
struct ScanContext {
    store: Arc<dyn ValueBetStore>,
    matcher: EventMatcher,
    comparator: MarketComparator,
    freshness: FreshnessPolicy,
    now: NaiveDateTime,
}

impl ScanContext {
    async fn scan_shard(&self, pair: &SourcePair, plan: &ShardPlan) -> ShardOutcome {
        let scans = plan
            .competitions
            .iter()
            .map(|competition| self.scan_competition(pair, &plan.date, competition));

        let mut outcome = ShardOutcome::default();
        for part in join_all(scans).await {
            outcome.produced.extend(part.produced);
            outcome.failed_writes.extend(part.failed_writes);
            outcome.failed_scopes.extend(part.failed_scopes);
        }

        debug!(
            shard = plan.index,
            pair = %pair.label(),
            date = %plan.date,
            produced = outcome.produced.len(),
            failed_scopes = outcome.failed_scopes.len(),
            "Shard complete"
        );

        outcome
    }

    async fn scan_competition(&self, pair: &SourcePair, date: &str, competition: &str) -> ShardOutcome {
        let mut outcome = ShardOutcome::default();

        let (references, others) = tokio::join!(
            fetch(pair.reference.as_ref(), date, competition),
            fetch(pair.other.as_ref(), date, competition)
        );
        let (references, others) = match (references, others) {
            (Ok(r), Ok(o)) => (r, o),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = ?e, "Fetch failed, shard yields no candidates");
                outcome.failed_scopes.push(ScanScope {
                    event_date: date.to_string(),
                    competition: competition.to_string(),
                });
                return outcome;
            }
        };

        for (reference, other) in self.pair_records(&references, &others) {
            let Some(record) = self.evaluate_pair(reference, other) else {
                continue;
            };

            match self.store.upsert(&record).await {
                Ok(()) => {
                    debug!(
                        id = %record.id,
                        teams = %record.teams,
                        bets = record.bet_count(),
                        "Value bet stored"
                    );
                    outcome.produced.push(record.id);
                }
                Err(source) => {
                    let err = ScanError::Persist {
                        id: record.id.clone(),
                        source,
                    };
                    error!(error = ?err, match_id = %record.match_id, "Value bet write not confirmed");
                    outcome.failed_writes.push(record.id);
                }
            }
        }

        outcome
    }

    /// Pairs records as `(reference, other)`.
    ///
    /// The smaller side is iterated and each of its records is matched into
    /// the larger side. Records whose kickoff is too close are skipped.
    fn pair_records<'a>(
        &self,
        references: &'a [EventRecord],
        others: &'a [EventRecord],
    ) -> Vec<(&'a EventRecord, &'a EventRecord)> {
        let reference_is_smaller = references.len() <= others.len();
        let (iterated, candidates) = if reference_is_smaller {
            (references, others)
        } else {
            (others, references)
        };

        iterated
            .iter()
            .filter(|record| {
                let passed = self.freshness.kickoff_passed(record, self.now);
                if passed {
                    trace!(fixture = %record.fixture(), time = %record.time, "Kickoff too close, skipping");
                }
                !passed
            })
            .filter_map(|record| {
                let found = self.matcher.find_match(record, candidates)?;
                Some(if reference_is_smaller {
                    (record, found)
                } else {
                    (found, record)
                })
            })
            .collect()
    }

    /// Runs a matched pair through the comparison pipeline.
    ///
    /// Returns `None` for stale pairs and pairs without any value bet.
    fn evaluate_pair(&self, reference: &EventRecord, other: &EventRecord) -> Option<ValueBetRecord> {
        if !self.freshness.pair_is_fresh(reference, other, self.now) {
            trace!(
                reference = %reference.id,
                other = %other.id,
                "Stale pair, skipping"
            );
            return None;
        }

        let (reference_markets, other_markets) = equalize(&reference.markets, &other.markets);
        let reference = EventRecord {
            markets: normalize_tree(&reference_markets),
            ..reference.clone()
        };
        let other = EventRecord {
            markets: other_markets,
            ..other.clone()
        };

        let record = prune_record(self.comparator.compare_records(&reference, &other, self.now));
        record.has_markets().then_some(record)
    }
}

async fn fetch(source: &dyn EventSource, date: &str, competition: &str) -> Result<Vec<EventRecord>, ScanError> {
    source
        .find(date, competition)
        .await
        .map_err(|source_err| ScanError::Fetch {
            collection: source.name().to_string(),
            date: date.to_string(),
            competition: competition.to_string(),
            source: source_err,
        })
}

// =============================================================================
// Value Bet Scanner
// =============================================================================

/// Runs scan passes over configured source pairs.
pub struct ValueBetScanner {
    config: ScannerConfig,
    pairs: Vec<SourcePair>,
    store: Arc<dyn ValueBetStore>,
    matcher: EventMatcher,
    comparator: MarketComparator,
    freshness: FreshnessPolicy,
}

impl ValueBetScanner {
    #[must_use]
    pub fn new(config: ScannerConfig, pairs: Vec<SourcePair>, store: Arc<dyn ValueBetStore>) -> Self {
        let matcher = EventMatcher::with_config(
            MatchConfig::default().with_early_exit_score(config.match_early_exit_score),
        );
        let comparator = MarketComparator::from_config(&config);
        let freshness = FreshnessPolicy::new(config.effective_freshness());

        Self {
            config,
            pairs,
            store,
            matcher,
            comparator,
            freshness,
        }
    }

    /// Splits a pass into shards.
    ///
    /// Competitions are cut into `max(1, max_workers / pairs)` chunks per
    /// pair and day, so the shard count stays close to the worker budget.
    #[must_use]
    pub fn plan_shards(&self, now: NaiveDateTime) -> Vec<ShardPlan> {
        let competitions = &self.config.competitions;
        if self.pairs.is_empty() || competitions.is_empty() {
            return Vec::new();
        }

        let chunks = (self.config.max_workers / self.pairs.len()).max(1);
        let chunk_size = competitions.len().div_ceil(chunks).max(1);

        let dates: Vec<String> = (0..self.config.effective_day_horizon())
            .map(|offset| {
                (now.date() + ChronoDuration::days(i64::from(offset)))
                    .format(DATE_FORMAT)
                    .to_string()
            })
            .collect();

        let mut plans = Vec::new();
        for pair_index in 0..self.pairs.len() {
            for date in &dates {
                for chunk in competitions.chunks(chunk_size) {
                    plans.push(ShardPlan {
                        index: plans.len(),
                        pair_index,
                        date: date.clone(),
                        competitions: chunk.to_vec(),
                    });
                }
            }
        }
        plans
    }

    /// Runs one pass at the current local time.
    ///
    /// # Errors
    /// Returns an error only if the final sweep fails.
    pub async fn run_pass(&self) -> Result<PassSummary, ScanError> {
        self.run_pass_at(Local::now().naive_local()).await
    }

    /// Runs one pass as if the wall clock read `now`.
    ///
    /// # Errors
    /// Returns an error only if the final sweep fails. Shard failures are
    /// logged and reflected in the summary.
    pub async fn run_pass_at(&self, now: NaiveDateTime) -> Result<PassSummary, ScanError> {
        let started = Instant::now();
        let plans = self.plan_shards(now);

        info!(
            mode = %self.config.mode,
            pairs = self.pairs.len(),
            shards = plans.len(),
            "Starting scan pass"
        );

        let ctx = Arc::new(ScanContext {
            store: Arc::clone(&self.store),
            matcher: self.matcher.clone(),
            comparator: self.comparator.clone(),
            freshness: self.freshness.clone(),
            now,
        });
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));

        let mut tasks = JoinSet::new();
        let mut pending: BTreeMap<usize, ShardPlan> = BTreeMap::new();

        for plan in plans {
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            let pair = self.pairs[plan.pair_index].clone();
            let task_plan = plan.clone();
            pending.insert(plan.index, plan);

            tasks.spawn(async move {
                let index = task_plan.index;
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, None);
                };
                let outcome = AssertUnwindSafe(ctx.scan_shard(&pair, &task_plan))
                    .catch_unwind()
                    .await
                    .ok();
                (index, outcome)
            });
        }

        let mut acc = PassAccumulator::default();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(self.config.pass_timeout_secs);
        let mut timed_out = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => {
                    let Some(plan) = pending.remove(&index) else {
                        continue;
                    };
                    match outcome {
                        Some(outcome) => acc.absorb(outcome),
                        None => {
                            error!(shard = index, date = %plan.date, "Shard panicked");
                            acc.failed_shards += 1;
                            acc.protect_shard(&plan);
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    error!(error = %e, "Shard task failed to join");
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out {
            // wait for aborted shards so no write lands after the sweep
            tasks.shutdown().await;
            acc.timed_out_shards = pending.len();
            warn!(
                timeout_secs = self.config.pass_timeout_secs,
                aborted = pending.len(),
                "Pass timed out, aborted remaining shards"
            );
        } else if !pending.is_empty() {
            acc.failed_shards += pending.len();
        }
        for plan in pending.values() {
            acc.protect_shard(plan);
        }

        let mut summary = PassSummary {
            produced: acc.produced.len(),
            failed_shards: acc.failed_shards,
            timed_out_shards: acc.timed_out_shards,
            ..PassSummary::default()
        };

        match acc.keep_set(self.store.as_ref()).await {
            Ok(keep) => {
                summary.deleted = self
                    .store
                    .delete_except(&keep)
                    .await
                    .map_err(ScanError::Sweep)?;
            }
            Err(e) => {
                warn!(error = ?e, "Skipping sweep for this pass");
                summary.sweep_skipped = true;
            }
        }

        summary.duration = started.elapsed();

        info!(
            produced = summary.produced,
            deleted = summary.deleted,
            failed_shards = summary.failed_shards,
            timed_out_shards = summary.timed_out_shards,
            duration_ms = summary.duration.as_millis() as u64,
            "Scan pass complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use valuebet_core::SourcePairConfig;
    use valuebet_data::{MarketNode, MarketTree, MemoryEventSource, MemoryValueBetStore};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn event(id: &str, bookmaker: &str, home: &str, away: &str, odds: [rust_decimal::Decimal; 2]) -> EventRecord {
        let mut markets = MarketTree::new();
        markets.insert("Moneyline".to_string(), MarketNode::Market(odds.to_vec()));
        EventRecord {
            id: id.to_string(),
            bookmaker_name: bookmaker.to_string(),
            sport_name: "football".to_string(),
            competition: "Spain La Liga".to_string(),
            teams: [home.to_string(), away.to_string()],
            date: "19/10/26".to_string(),
            time: "20:00".to_string(),
            is_live: false,
            last_modified_date: "19/10/26".to_string(),
            last_modified_time: "11:50:00".to_string(),
            markets,
        }
    }

    fn scanner(config: ScannerConfig, pairs: usize) -> ValueBetScanner {
        let pairs = (0..pairs)
            .map(|i| {
                SourcePair::new(
                    Arc::new(MemoryEventSource::new(format!("ref_{i}"))),
                    Arc::new(MemoryEventSource::new(format!("other_{i}"))),
                )
            })
            .collect();
        ValueBetScanner::new(config, pairs, Arc::new(MemoryValueBetStore::new()))
    }

    fn context() -> ScanContext {
        ScanContext {
            store: Arc::new(MemoryValueBetStore::new()),
            matcher: EventMatcher::new(),
            comparator: MarketComparator::default(),
            freshness: FreshnessPolicy::default(),
            now: now(),
        }
    }

    #[test]
    fn test_plan_shards_chunks_by_worker_budget() {
        let config = ScannerConfig::line()
            .with_competitions((0..10).map(|i| format!("League {i}")).collect())
            .with_max_workers(8)
            .with_day_horizon(3)
            .with_pairs(vec![
                SourcePairConfig::new("a", "b"),
                SourcePairConfig::new("a", "c"),
            ]);
        let scanner = scanner(config, 2);
        let plans = scanner.plan_shards(now());

        // 2 pairs x 3 days x 4 chunks
        assert_eq!(plans.len(), 24);
        assert_eq!(plans[0].date, "19/10/26");
        assert_eq!(plans.last().unwrap().date, "21/10/26");
        let covered: usize = plans.iter().take(4).map(|p| p.competitions.len()).sum();
        assert_eq!(covered, 10);
    }

    #[test]
    fn test_plan_shards_live_single_day() {
        let config = ScannerConfig::live()
            .with_competitions(vec!["Spain La Liga".to_string()])
            .with_max_workers(1);
        let scanner = scanner(config, 3);
        let plans = scanner.plan_shards(now());

        assert_eq!(plans.len(), 3);
        assert!(plans.iter().all(|p| p.date == "19/10/26"));
    }

    #[test]
    fn test_plan_shards_empty_competitions() {
        let config = ScannerConfig::line().with_competitions(Vec::new());
        assert!(scanner(config, 1).plan_shards(now()).is_empty());
    }

    #[test]
    fn test_pair_records_orients_pairs() {
        let ctx = context();
        let references = vec![
            event("p1", "Pinnacle", "Sevilla", "Betis", [dec!(2.0), dec!(2.0)]),
            event("p2", "Pinnacle", "Girona", "Getafe", [dec!(2.0), dec!(2.0)]),
        ];
        let others = vec![event("s1", "Stake", "Girona", "Getafe", [dec!(2.1), dec!(1.8)])];

        let pairs = ctx.pair_records(&references, &others);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.id, "p2");
        assert_eq!(pairs[0].1.id, "s1");
    }

    #[test]
    fn test_evaluate_pair_produces_record() {
        let ctx = context();
        let reference = event("p1", "Pinnacle", "Sevilla", "Betis", [dec!(1.9), dec!(1.9)]);
        let other = event("s1", "Stake", "Sevilla", "Betis", [dec!(2.05), dec!(1.8)]);

        let record = ctx.evaluate_pair(&reference, &other).unwrap();
        assert_eq!(record.bookmaker_name, "Pinnacle - Stake");
        assert_eq!(record.bet_count(), 1);
    }

    #[test]
    fn test_evaluate_pair_without_value() {
        let ctx = context();
        let reference = event("p1", "Pinnacle", "Sevilla", "Betis", [dec!(2.0), dec!(2.0)]);
        let other = event("s1", "Stake", "Sevilla", "Betis", [dec!(1.95), dec!(1.95)]);

        assert!(ctx.evaluate_pair(&reference, &other).is_none());
    }

    #[test]
    fn test_summary_display() {
        let summary = PassSummary {
            produced: 2,
            deleted: 1,
            ..PassSummary::default()
        };
        assert!(summary.to_string().starts_with("produced=2 deleted=1"));
    }
}
