//! Compatibility filter for candidate pairing
//!
//! A pure predicate deciding whether two users may be paired: mutual
//! gender/preference satisfaction and absence of blocking in either
//! direction.

use crate::types::User;
use serde::{Deserialize, Serialize};

/// How unset gender/preference fields are treated during matching
///
/// Both behaviors appeared over the system's evolution, so the choice is
/// explicit configuration rather than an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferencePolicy {
    /// Unset fields act as wildcards; anyone can match anyone
    PermissiveAny,
    /// Both users must have declared gender and preference before pairing
    StrictPreferenceRequired,
}

impl Default for PreferencePolicy {
    fn default() -> Self {
        PreferencePolicy::PermissiveAny
    }
}

/// Decide whether two users may be paired
///
/// The preference gate is mutual: each side's declared preference must accept
/// the other's gender. Blocking in either direction always refuses the pair.
pub fn is_compatible(a: &User, b: &User, policy: PreferencePolicy) -> bool {
    if a.id == b.id {
        return false;
    }

    if a.has_blocked(b.id) || b.has_blocked(a.id) {
        return false;
    }

    if policy == PreferencePolicy::StrictPreferenceRequired
        && (!a.profile_complete() || !b.profile_complete())
    {
        return false;
    }

    accepts(a, b) && accepts(b, a)
}

/// One direction of the preference gate: does `who`'s preference accept
/// `other`'s gender? Unset fields are wildcards here; the strict policy has
/// already refused incomplete profiles.
fn accepts(who: &User, other: &User) -> bool {
    match (who.preference, other.gender) {
        (Some(pref), Some(gender)) => pref.accepts(gender),
        _ => true,
    }
}
