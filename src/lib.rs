//! Duet - Matchmaking engine for anonymous one-on-one chats
//!
//! This crate pairs anonymous users for one-on-one chat sessions by
//! availability, declared gender/preference, and optional shared interests.
//! The chat transport and external persistence are collaborators behind
//! traits.

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod matching;
pub mod notify;
pub mod pool;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use directory::{InMemoryUserStore, UserStore};
pub use engine::{ConnectOutcome, Matchmaker, StopOutcome};
pub use matching::{MatchStrategy, PartnerMatcher, PreferencePolicy};
pub use notify::ChatNotifier;
pub use pool::WaitingPool;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
