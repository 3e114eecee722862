//! Configuration management for the matchmaking engine

pub mod app;

pub use app::{AppConfig, MatchmakingSettings, ServiceSettings};
