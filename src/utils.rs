//! Utility functions for the matchmaking engine

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique pair ID
pub fn generate_pair_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}
