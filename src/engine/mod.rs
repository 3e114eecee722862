//! Matchmaking engine: connection lifecycle and profile sessions

pub mod matchmaker;
pub mod session;

pub use matchmaker::{ConnectOutcome, Matchmaker, MatchmakerStats, SessionStatus, StopOutcome};
pub use session::{ProfileField, ProfileInputOutcome};
