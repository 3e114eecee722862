//! Interest-based match scoring

use crate::types::User;

/// Count interests present in both users' interest sets
///
/// Used only to rank candidates that already passed the compatibility
/// filter; a score of zero never vetoes a pairing by itself.
pub fn shared_interest_count(a: &User, b: &User) -> usize {
    if a.interests.is_empty() || b.interests.is_empty() {
        return 0;
    }
    a.interests.intersection(&b.interests).count()
}
