//! Error types for the matchmaking engine
//!
//! This module defines all error types using anyhow for consistent error
//! handling throughout the application.

use crate::types::UserId;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("User {user_id} is already connected")]
    AlreadyConnected { user_id: UserId },

    #[error("User {user_id} is not in a chat session")]
    NotInSession { user_id: UserId },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: UserId },

    #[error("Pairing conflict: {message}")]
    PairConflict { message: String },

    #[error("Invalid {field} input: {value}")]
    InvalidProfileInput { field: String, value: String },

    #[error("Storage operation failed: {message}")]
    StorageFailure { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal engine error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// Whether this error represents a transient pairing conflict that the
    /// connect loop should absorb by retrying the search
    pub fn is_conflict(&self) -> bool {
        matches!(self, MatchmakingError::PairConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        let conflict = MatchmakingError::PairConflict {
            message: "candidate already paired".to_string(),
        };
        assert!(conflict.is_conflict());

        let other = MatchmakingError::AlreadyConnected { user_id: 1 };
        assert!(!other.is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = MatchmakingError::InvalidProfileInput {
            field: "gender".to_string(),
            value: "plasma".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid gender input: plasma");
    }
}
