//! User storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving user
//! records, with an in-memory implementation. The pairing commit is part of
//! the interface so that externally persisted backends can make it
//! transactional: marking both users connected is all-or-nothing, and a
//! candidate claimed by a concurrent winner surfaces as a conflict instead of
//! corrupting state.

use crate::error::{MatchmakingError, Result};
use crate::types::{ConnectionState, ConversationState, User, UserId};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

/// Trait for user directory operations
pub trait UserStore: Send + Sync {
    /// Get a user record
    fn load(&self, id: UserId) -> Result<Option<User>>;

    /// Store or update a user record
    fn save(&self, user: User) -> Result<()>;

    /// Get a user record, materializing a default one on first interaction
    fn load_or_create(&self, id: UserId) -> Result<User>;

    /// Apply a mutation to a user record in one critical section,
    /// materializing a default record first when absent
    ///
    /// Profile writes go through here so they cannot interleave with a
    /// concurrent connection transition on the same record.
    fn update(&self, id: UserId, mutator: &mut dyn FnMut(&mut User)) -> Result<User>;

    /// Transition a user to `Waiting` before enqueueing
    ///
    /// Fails with [`MatchmakingError::PairConflict`] when the user was
    /// connected by a concurrent operation in the meantime. Already waiting
    /// is a no-op.
    fn mark_waiting(&self, id: UserId) -> Result<()>;

    /// Transition a user back to `Idle` iff currently `Waiting`
    ///
    /// Returns whether a transition happened; false covers both missing
    /// records and users in other states.
    fn resign_waiting(&self, id: UserId) -> Result<bool>;

    /// Atomically commit a pairing: both users become `Connected` with
    /// mutual partner ids and their conversation state reset, or neither
    /// record changes
    ///
    /// Fails with [`MatchmakingError::PairConflict`] when a concurrent
    /// operation already altered either side (caller connected elsewhere,
    /// candidate no longer waiting). Returns the updated records in
    /// `(caller, candidate)` order.
    fn commit_pair(&self, caller_id: UserId, candidate_id: UserId) -> Result<(User, User)>;

    /// Atomically tear down the pairing the given user participates in
    ///
    /// Both ends transition to `Idle`. Returns the partner id when the
    /// partner record was found and cleaned up; a partner that was already
    /// cleaned up is tolerated and yields `None`.
    fn disconnect_pair(&self, id: UserId) -> Result<Option<UserId>>;

    /// Number of users currently in the `Waiting` state
    fn count_waiting(&self) -> Result<usize>;
}

/// In-memory user directory implementation
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<UserId, User>>> {
        self.users.read().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire users read lock".to_string(),
            }
            .into()
        })
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<UserId, User>>> {
        self.users.write().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire users write lock".to_string(),
            }
            .into()
        })
    }
}

impl UserStore for InMemoryUserStore {
    fn load(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.read_lock()?.get(&id).cloned())
    }

    fn save(&self, user: User) -> Result<()> {
        self.write_lock()?.insert(user.id, user);
        Ok(())
    }

    fn load_or_create(&self, id: UserId) -> Result<User> {
        let mut users = self.write_lock()?;
        Ok(users.entry(id).or_insert_with(|| User::new(id)).clone())
    }

    fn update(&self, id: UserId, mutator: &mut dyn FnMut(&mut User)) -> Result<User> {
        let mut users = self.write_lock()?;
        let user = users.entry(id).or_insert_with(|| User::new(id));
        mutator(user);
        user.last_activity = crate::utils::current_timestamp();
        Ok(user.clone())
    }

    fn mark_waiting(&self, id: UserId) -> Result<()> {
        let mut users = self.write_lock()?;
        let user = users.entry(id).or_insert_with(|| User::new(id));
        match user.connection {
            ConnectionState::Connected { partner } => Err(MatchmakingError::PairConflict {
                message: format!("user {} was connected to {} concurrently", id, partner),
            }
            .into()),
            _ => {
                user.connection = ConnectionState::Waiting;
                user.last_activity = crate::utils::current_timestamp();
                Ok(())
            }
        }
    }

    fn resign_waiting(&self, id: UserId) -> Result<bool> {
        let mut users = self.write_lock()?;
        match users.get_mut(&id) {
            Some(user) if user.is_waiting() => {
                user.connection = ConnectionState::Idle;
                user.last_activity = crate::utils::current_timestamp();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn commit_pair(&self, caller_id: UserId, candidate_id: UserId) -> Result<(User, User)> {
        if caller_id == candidate_id {
            return Err(MatchmakingError::PairConflict {
                message: format!("user {} cannot be paired with itself", caller_id),
            }
            .into());
        }

        let mut users = self.write_lock()?;

        // Validate both sides before touching either record.
        let caller = users
            .get(&caller_id)
            .ok_or(MatchmakingError::UserNotFound { user_id: caller_id })?;
        if caller.is_connected() {
            return Err(MatchmakingError::PairConflict {
                message: format!("caller {} already connected", caller_id),
            }
            .into());
        }

        let candidate =
            users
                .get(&candidate_id)
                .ok_or(MatchmakingError::UserNotFound {
                    user_id: candidate_id,
                })?;
        if !candidate.is_waiting() {
            return Err(MatchmakingError::PairConflict {
                message: format!(
                    "candidate {} no longer waiting ({:?})",
                    candidate_id, candidate.connection
                ),
            }
            .into());
        }

        // Connecting supersedes any half-finished profile prompt; the next
        // inbound message belongs to the chat, not the prompt.
        let now = crate::utils::current_timestamp();
        {
            let caller = users.get_mut(&caller_id).expect("validated above");
            caller.connection = ConnectionState::Connected {
                partner: candidate_id,
            };
            caller.conversation = ConversationState::Idle;
            caller.last_activity = now;
        }
        {
            let candidate = users.get_mut(&candidate_id).expect("validated above");
            candidate.connection = ConnectionState::Connected { partner: caller_id };
            candidate.conversation = ConversationState::Idle;
            candidate.last_activity = now;
        }

        Ok((
            users[&caller_id].clone(),
            users[&candidate_id].clone(),
        ))
    }

    fn disconnect_pair(&self, id: UserId) -> Result<Option<UserId>> {
        let mut users = self.write_lock()?;

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        let Some(partner_id) = user.partner_id() else {
            return Ok(None);
        };

        let now = crate::utils::current_timestamp();
        user.connection = ConnectionState::Idle;
        user.last_activity = now;

        match users.get_mut(&partner_id) {
            Some(partner) if partner.partner_id() == Some(id) => {
                partner.connection = ConnectionState::Idle;
                partner.last_activity = now;
                Ok(Some(partner_id))
            }
            _ => {
                // Partner already cleaned up by a concurrent operation.
                warn!(
                    "Partner {} of user {} was already disconnected",
                    partner_id, id
                );
                Ok(None)
            }
        }
    }

    fn count_waiting(&self) -> Result<usize> {
        Ok(self
            .read_lock()?
            .values()
            .filter(|user| user.is_waiting())
            .count())
    }
}
