//! Matchmaker implementation orchestrating pool, filter, scorer, and store
//!
//! This module provides the core engine that pairs users: `connect` either
//! commits a pairing or enqueues the caller, `stop` tears a session down,
//! and `report`/`block` feed the safety counters before ending the session.

use crate::directory::UserStore;
use crate::error::{MatchmakingError, Result};
use crate::matching::{MatchingConfig, PartnerMatcher};
use crate::notify::ChatNotifier;
use crate::pool::WaitingPool;
use crate::types::{ChatEnded, EndReason, PairConnected, ReportWarning, User, UserId};
use crate::utils::{current_timestamp, generate_pair_id};
use crate::config::MatchmakingSettings;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Result of a `connect` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A pairing was committed; the caller is now connected
    Paired {
        pair_id: crate::types::PairId,
        partner: UserId,
    },
    /// No candidate matched; the caller was enqueued
    Searching,
}

/// Result of a `stop` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// An active chat was ended; the partner id when it could be notified
    Ended { partner: Option<UserId> },
    /// The caller was waiting and left the pool
    LeftQueue,
    /// The caller was neither waiting nor connected
    NotInSession,
}

/// Connection status reported to the status command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotRegistered,
    Idle,
    Waiting,
    Connected,
}

/// Statistics about matchmaker operations
#[derive(Debug, Clone, Default)]
pub struct MatchmakerStats {
    /// Total pairings committed
    pub pairs_committed: u64,
    /// Total callers enqueued to wait
    pub users_enqueued: u64,
    /// Total sessions ended via stop/next/report/block
    pub sessions_ended: u64,
    /// Total reports filed against partners
    pub reports_filed: u64,
    /// Total blocks filed against partners
    pub blocks_filed: u64,
    /// Pairing commits retried after losing to a concurrent winner
    pub conflicts_retried: u64,
    /// Pool entries dropped because the directory no longer said `Waiting`
    pub stale_entries_skipped: u64,
    /// Current number of users waiting in the pool
    pub users_waiting: usize,
}

/// The core matchmaking engine
///
/// All pool mutations and pair transitions of one call appear atomic to
/// concurrent callers: candidate selection and the pairing commit run under
/// the pool lock, and the directory serializes the two-record commit.
pub struct Matchmaker {
    directory: Arc<dyn UserStore>,
    pool: Mutex<WaitingPool>,
    matcher: Box<dyn PartnerMatcher>,
    notifier: Arc<dyn ChatNotifier>,
    settings: MatchmakingSettings,
    stats: RwLock<MatchmakerStats>,
}

impl Matchmaker {
    /// Create a matchmaker with the strategy named in the settings
    pub fn new(
        directory: Arc<dyn UserStore>,
        notifier: Arc<dyn ChatNotifier>,
        settings: MatchmakingSettings,
    ) -> Self {
        let matcher = settings.match_strategy.build();
        Self::with_matcher(directory, notifier, matcher, settings)
    }

    /// Create a matchmaker with a custom selection strategy
    pub fn with_matcher(
        directory: Arc<dyn UserStore>,
        notifier: Arc<dyn ChatNotifier>,
        matcher: Box<dyn PartnerMatcher>,
        settings: MatchmakingSettings,
    ) -> Self {
        Self {
            directory,
            pool: Mutex::new(WaitingPool::new()),
            matcher,
            notifier,
            settings,
            stats: RwLock::new(MatchmakerStats::default()),
        }
    }

    pub fn settings(&self) -> &MatchmakingSettings {
        &self.settings
    }

    pub(crate) fn directory(&self) -> &dyn UserStore {
        self.directory.as_ref()
    }

    /// Snapshot of operation statistics
    pub fn stats(&self) -> Result<MatchmakerStats> {
        let mut stats = self
            .stats
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?
            .clone();
        stats.users_waiting = self.lock_pool()?.len();
        Ok(stats)
    }

    fn lock_pool(&self) -> Result<std::sync::MutexGuard<'_, WaitingPool>> {
        self.pool.lock().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire pool lock".to_string(),
            }
            .into()
        })
    }

    fn with_stats(&self, f: impl FnOnce(&mut MatchmakerStats)) -> Result<()> {
        let mut stats = self
            .stats
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
        f(&mut stats);
        Ok(())
    }

    /// Find a partner for the caller or enqueue them
    ///
    /// Fails fast with [`MatchmakingError::AlreadyConnected`] and no side
    /// effects when the caller is in an active chat.
    pub async fn connect(&self, id: UserId) -> Result<ConnectOutcome> {
        let caller = self.directory.load_or_create(id)?;
        if caller.is_connected() {
            debug!("Connect refused: user {} already connected", id);
            return Err(MatchmakingError::AlreadyConnected { user_id: id }.into());
        }

        let config = self.settings.matching_config();
        let committed = self.select_and_commit(&caller, &config)?;

        match committed {
            Some((pair_id, caller, partner)) => {
                info!(
                    "Pair {} committed: {} <-> {}",
                    pair_id, caller.id, partner.id
                );
                self.with_stats(|s| s.pairs_committed += 1)?;

                self.notifier
                    .notify_pair_connected(PairConnected {
                        pair_id,
                        users: [caller.id, partner.id],
                        timestamp: current_timestamp(),
                    })
                    .await?;
                self.send_report_warnings(&caller, &partner).await?;

                Ok(ConnectOutcome::Paired {
                    pair_id,
                    partner: partner.id,
                })
            }
            None => {
                info!("No candidate for user {}, enqueued as waiting", id);
                self.with_stats(|s| s.users_enqueued += 1)?;
                self.notifier.notify_searching(id).await?;
                Ok(ConnectOutcome::Searching)
            }
        }
    }

    /// Candidate selection and pairing commit, serialized by the pool lock
    ///
    /// Losing a commit race to a concurrent winner re-enters selection; the
    /// claimed candidate is already out of the pool by then.
    fn select_and_commit(
        &self,
        caller: &User,
        config: &MatchingConfig,
    ) -> Result<Option<(crate::types::PairId, User, User)>> {
        let mut pool = self.lock_pool()?;

        // Prevents self-matching and duplicate entries on retry.
        pool.remove(caller.id);

        loop {
            let span = pool.len();
            let candidate =
                self.matcher
                    .select_partner(caller, &mut pool, self.directory.as_ref(), config)?;

            // Matchers only shrink the pool, by the winner and by dropped
            // stale entries; the difference is the stale count.
            let dropped = span - pool.len() - usize::from(candidate.is_some());
            if dropped > 0 {
                self.with_stats(|s| s.stale_entries_skipped += dropped as u64)?;
            }

            let Some(candidate) = candidate else {
                // Enqueue under the same lock so no concurrent caller can
                // observe a waiting directory record missing from the pool.
                self.directory.mark_waiting(caller.id)?;
                pool.add(caller.id);
                return Ok(None);
            };

            match self.directory.commit_pair(caller.id, candidate.id) {
                Ok((caller, partner)) => {
                    return Ok(Some((generate_pair_id(), caller, partner)));
                }
                Err(err) => {
                    let conflict = err
                        .downcast_ref::<MatchmakingError>()
                        .map_or(false, MatchmakingError::is_conflict);
                    if !conflict {
                        return Err(err);
                    }

                    // The caller side of the conflict is terminal: a
                    // concurrent connect already paired them, so the
                    // candidate goes back to the pool untouched.
                    let caller_connected = self
                        .directory
                        .load(caller.id)?
                        .map_or(false, |user| user.is_connected());
                    if caller_connected {
                        pool.push_front(candidate.id);
                        return Err(
                            MatchmakingError::AlreadyConnected { user_id: caller.id }.into()
                        );
                    }

                    warn!(
                        "Candidate {} claimed concurrently, retrying search: {}",
                        candidate.id, err
                    );
                    self.with_stats(|s| s.conflicts_retried += 1)?;
                }
            }
        }
    }

    /// Caution each party whose new partner carries a high report count
    async fn send_report_warnings(&self, a: &User, b: &User) -> Result<()> {
        let threshold = self.settings.report_warning_threshold;
        for (recipient, partner) in [(a, b), (b, a)] {
            if partner.report_count >= threshold {
                self.notifier
                    .notify_report_warning(ReportWarning {
                        user_id: recipient.id,
                        partner_report_count: partner.report_count,
                        timestamp: current_timestamp(),
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// End the caller's current session or leave the waiting pool
    pub async fn stop(&self, id: UserId) -> Result<StopOutcome> {
        self.stop_with_reason(id, EndReason::PartnerStopped).await
    }

    async fn stop_with_reason(&self, id: UserId, reason: EndReason) -> Result<StopOutcome> {
        let Some(user) = self.directory.load(id)? else {
            return Ok(StopOutcome::NotInSession);
        };

        if user.is_waiting() {
            self.lock_pool()?.remove(id);
            if self.directory.resign_waiting(id)? {
                info!("User {} left the waiting pool", id);
                return Ok(StopOutcome::LeftQueue);
            }
            // Lost a race: a concurrent connect claimed this user while we
            // were leaving. Fall through and tear the new pairing down.
        }

        let still_connected = self
            .directory
            .load(id)?
            .map_or(false, |user| user.is_connected());
        if !still_connected {
            return Ok(StopOutcome::NotInSession);
        }

        let partner = self.directory.disconnect_pair(id)?;
        self.with_stats(|s| s.sessions_ended += 1)?;
        info!("User {} ended chat, partner: {:?}", id, partner);

        if let Some(partner_id) = partner {
            self.notifier
                .notify_chat_ended(ChatEnded {
                    user_id: partner_id,
                    reason,
                    timestamp: current_timestamp(),
                })
                .await?;
        }

        Ok(StopOutcome::Ended { partner })
    }

    /// End the current session, then immediately search for a new partner
    ///
    /// Two sequential steps, not atomic across the pair: a failure between
    /// them leaves the caller Idle, which is always a safe state.
    pub async fn next(&self, id: UserId) -> Result<ConnectOutcome> {
        self.stop_with_reason(id, EndReason::PartnerSkipped).await?;
        self.connect(id).await
    }

    /// Report the caller's connection status
    pub fn status(&self, id: UserId) -> Result<SessionStatus> {
        Ok(match self.directory.load(id)? {
            None => SessionStatus::NotRegistered,
            Some(user) if user.is_connected() => SessionStatus::Connected,
            Some(user) if user.is_waiting() => SessionStatus::Waiting,
            Some(_) => SessionStatus::Idle,
        })
    }

    /// Report the current partner and end the session
    ///
    /// The report increments the partner's counter as a warning-threshold
    /// signal only; it never bans. Ending the session is terminal regardless
    /// of the increment outcome.
    pub async fn report(&self, id: UserId) -> Result<StopOutcome> {
        let partner_id = self.connected_partner(id)?;

        let partner = self.directory.update(partner_id, &mut |user| {
            user.report_count += 1;
        })?;
        self.with_stats(|s| s.reports_filed += 1)?;
        info!(
            "User {} reported partner {}, report count now {}",
            id, partner_id, partner.report_count
        );

        self.stop_with_reason(id, EndReason::Reported).await
    }

    /// Block the current partner and end the session
    pub async fn block(&self, id: UserId) -> Result<StopOutcome> {
        let partner_id = self.connected_partner(id)?;

        self.directory.update(id, &mut |user| {
            user.blocked_peers.insert(partner_id);
        })?;
        self.with_stats(|s| s.blocks_filed += 1)?;
        info!("User {} blocked partner {}", id, partner_id);

        self.stop_with_reason(id, EndReason::Blocked).await
    }

    fn connected_partner(&self, id: UserId) -> Result<UserId> {
        self.directory
            .load(id)?
            .and_then(|user| user.partner_id())
            .ok_or_else(|| MatchmakingError::NotInSession { user_id: id }.into())
    }
}
