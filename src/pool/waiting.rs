//! FIFO waiting pool implementation
//!
//! The pool holds ids of users currently seeking a partner. It is an
//! index-stable double-ended queue with an auxiliary membership set, so head
//! pop and tail append are O(1) and arbitrary-id removal never leaves a
//! dangling tail.

use crate::types::UserId;
use std::collections::{HashSet, VecDeque};

/// Ordered collection of user ids awaiting pairing
///
/// No id ever appears twice. The pool itself is not synchronized; callers
/// wrap it in a mutex and hold the guard for the duration of one logical
/// operation.
#[derive(Debug, Default)]
pub struct WaitingPool {
    order: VecDeque<UserId>,
    members: HashSet<UserId>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    /// Append an id at the tail. Re-adding a present id is a no-op and
    /// returns false.
    pub fn add(&mut self, id: UserId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push_back(id);
        true
    }

    /// Remove an id wherever it sits. Returns false when absent, which is an
    /// expected outcome (a user may leave a pool they already left).
    pub fn remove(&mut self, id: UserId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|&entry| entry == id) {
            self.order.remove(pos);
        }
        true
    }

    /// Remove and return the head of the queue (FIFO discipline)
    pub fn pop_next(&mut self) -> Option<UserId> {
        let id = self.order.pop_front()?;
        self.members.remove(&id);
        Some(id)
    }

    /// Reinsert an id at the head, restoring the queue priority of a
    /// provisionally rejected candidate. Skips ids already present.
    pub fn push_front(&mut self, id: UserId) {
        if self.members.insert(id) {
            self.order.push_front(id);
        }
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate ids front to back without disturbing the order
    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.order.iter().copied()
    }
}
