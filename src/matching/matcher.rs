//! Candidate selection strategies over the waiting pool
//!
//! A matcher owns the policy for picking a partner out of the pool. Three
//! strategies are provided: plain first-available FIFO, the depth-bounded
//! interest search, and a whole-pool best-score scan. The strategy is chosen
//! at construction time via [`MatchStrategy`].

use crate::directory::UserStore;
use crate::error::Result;
use crate::matching::filter::{is_compatible, PreferencePolicy};
use crate::matching::score::shared_interest_count;
use crate::pool::WaitingPool;
use crate::types::{User, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which candidate selection strategy the engine uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Pop candidates in FIFO order, take the first compatible one
    FirstAvailable,
    /// Prefer shared interests within a bounded scan of the pool front
    InterestDepth,
    /// Scan the whole pool and take the highest shared-interest score
    BestOfPool,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::InterestDepth
    }
}

impl MatchStrategy {
    /// Build the matcher implementing this strategy
    pub fn build(self) -> Box<dyn PartnerMatcher> {
        match self {
            MatchStrategy::FirstAvailable => Box::new(FirstAvailableMatcher),
            MatchStrategy::InterestDepth => Box::new(InterestDepthMatcher),
            MatchStrategy::BestOfPool => Box::new(BestOfPoolMatcher),
        }
    }
}

/// Configuration for matching behavior
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// How unset gender/preference fields are treated
    pub preference_policy: PreferencePolicy,
    /// Maximum candidates inspected before the interest search gives up
    pub max_interest_search_depth: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            preference_policy: PreferencePolicy::default(),
            max_interest_search_depth: 5,
        }
    }
}

/// Trait for partner selection algorithms
///
/// On success the selected candidate has been removed from the pool; every
/// candidate inspected but not selected is back in the pool with its original
/// relative order intact. Entries whose directory record no longer says
/// `Waiting` are stale and are dropped from the pool, never restored.
pub trait PartnerMatcher: Send + Sync {
    fn select_partner(
        &self,
        caller: &User,
        pool: &mut WaitingPool,
        directory: &dyn UserStore,
        config: &MatchingConfig,
    ) -> Result<Option<User>>;
}

/// Load a pooled candidate, treating the directory as authoritative
///
/// Returns `None` for entries the directory no longer considers waiting;
/// such entries must not be restored to the pool.
fn load_waiting_candidate(directory: &dyn UserStore, id: UserId) -> Result<Option<User>> {
    match directory.load(id)? {
        Some(user) if user.is_waiting() => Ok(Some(user)),
        Some(user) => {
            warn!(
                "Stale pool entry for user {}: directory says {:?}, dropping",
                id, user.connection
            );
            Ok(None)
        }
        None => {
            warn!("Pool entry {} has no directory record, dropping", id);
            Ok(None)
        }
    }
}

/// Restore held-aside candidates at the pool front in original relative order
fn restore_held(pool: &mut WaitingPool, held: &[User]) {
    for candidate in held.iter().rev() {
        pool.push_front(candidate.id);
    }
}

/// Pop candidates in pool order and take the first compatible one
///
/// Incompatible candidates are held aside and requeued at their original
/// position afterwards, so a skipped user never loses queue priority.
#[derive(Debug, Default)]
pub struct FirstAvailableMatcher;

impl PartnerMatcher for FirstAvailableMatcher {
    fn select_partner(
        &self,
        caller: &User,
        pool: &mut WaitingPool,
        directory: &dyn UserStore,
        config: &MatchingConfig,
    ) -> Result<Option<User>> {
        let mut held: Vec<User> = Vec::new();
        let mut selected = None;

        while let Some(id) = pool.pop_next() {
            let Some(candidate) = load_waiting_candidate(directory, id)? else {
                continue;
            };

            if is_compatible(caller, &candidate, config.preference_policy) {
                selected = Some(candidate);
                break;
            }

            debug!(
                "Candidate {} incompatible with caller {}, holding aside",
                candidate.id, caller.id
            );
            held.push(candidate);
        }

        restore_held(pool, &held);
        Ok(selected)
    }
}

/// Depth-bounded interest search over the pool front
///
/// A caller with declared interests inspects up to
/// `max_interest_search_depth` candidates and accepts the first compatible
/// one sharing at least one interest; everything inspected and not taken is
/// restored front-first. An unbounded interest search would let one picky
/// connect call block behind an arbitrarily large pool, so the bound keeps
/// latency predictable before falling back to indiscriminate pairing.
///
/// Callers without interests degrade to first-available semantics.
#[derive(Debug, Default)]
pub struct InterestDepthMatcher;

impl PartnerMatcher for InterestDepthMatcher {
    fn select_partner(
        &self,
        caller: &User,
        pool: &mut WaitingPool,
        directory: &dyn UserStore,
        config: &MatchingConfig,
    ) -> Result<Option<User>> {
        if caller.interests.is_empty() {
            return FirstAvailableMatcher.select_partner(caller, pool, directory, config);
        }

        let mut held: Vec<User> = Vec::new();
        let mut selected = None;
        let mut inspected = 0usize;

        while inspected < config.max_interest_search_depth {
            let Some(id) = pool.pop_next() else {
                break;
            };
            inspected += 1;

            let Some(candidate) = load_waiting_candidate(directory, id)? else {
                continue;
            };

            if is_compatible(caller, &candidate, config.preference_policy)
                && shared_interest_count(caller, &candidate) > 0
            {
                debug!(
                    "Interest match: caller {} and candidate {} share {} interest(s)",
                    caller.id,
                    candidate.id,
                    shared_interest_count(caller, &candidate)
                );
                selected = Some(candidate);
                break;
            }

            held.push(candidate);
        }

        restore_held(pool, &held);
        Ok(selected)
    }
}

/// Whole-pool scan picking the compatible candidate with the highest
/// shared-interest score
///
/// Pool order is left untouched except for removing the winner. Ties are
/// broken by pool order: the earliest-queued candidate wins.
#[derive(Debug, Default)]
pub struct BestOfPoolMatcher;

impl PartnerMatcher for BestOfPoolMatcher {
    fn select_partner(
        &self,
        caller: &User,
        pool: &mut WaitingPool,
        directory: &dyn UserStore,
        config: &MatchingConfig,
    ) -> Result<Option<User>> {
        let snapshot: Vec<UserId> = pool.iter().collect();
        let mut stale: Vec<UserId> = Vec::new();
        let mut best: Option<(usize, User)> = None;

        for id in snapshot {
            let Some(candidate) = load_waiting_candidate(directory, id)? else {
                stale.push(id);
                continue;
            };

            if !is_compatible(caller, &candidate, config.preference_policy) {
                continue;
            }

            let score = shared_interest_count(caller, &candidate);
            // Strict comparison keeps the earliest-queued candidate on ties.
            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, candidate));
            }
        }

        for id in stale {
            pool.remove(id);
        }

        if let Some((score, winner)) = best {
            debug!(
                "Best-of-pool winner for caller {}: candidate {} with score {}",
                caller.id, winner.id, score
            );
            pool.remove(winner.id);
            return Ok(Some(winner));
        }

        Ok(None)
    }
}
