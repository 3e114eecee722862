//! Application state wiring the engine components together
//!
//! `AppState` builds the user directory, waiting pool, matcher, and notifier
//! from configuration and owns the service lifecycle. A deployment swaps the
//! in-memory directory and log notifier for transport- and storage-backed
//! implementations through the same constructors.

use crate::config::AppConfig;
use crate::directory::{InMemoryUserStore, UserStore};
use crate::engine::Matchmaker;
use crate::error::Result;
use crate::notify::{ChatNotifier, LogNotifier};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Snapshot of service health, logged periodically
#[derive(Debug, Clone)]
pub struct ServiceStats {
    pub pairs_committed: u64,
    pub users_enqueued: u64,
    pub sessions_ended: u64,
    pub users_waiting: usize,
    pub uptime_seconds: i64,
}

/// Top-level application state
pub struct AppState {
    config: AppConfig,
    matchmaker: Arc<Matchmaker>,
    started_at: DateTime<Utc>,
    running: AtomicBool,
}

impl AppState {
    /// Wire up the engine with the default in-memory directory and log
    /// notifier
    pub fn new(config: AppConfig) -> Result<Self> {
        let directory: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let notifier: Arc<dyn ChatNotifier> = Arc::new(LogNotifier);
        Self::with_collaborators(config, directory, notifier)
    }

    /// Wire up the engine with externally provided collaborators
    pub fn with_collaborators(
        config: AppConfig,
        directory: Arc<dyn UserStore>,
        notifier: Arc<dyn ChatNotifier>,
    ) -> Result<Self> {
        let matchmaker = Arc::new(Matchmaker::new(
            directory,
            notifier,
            config.matchmaking.clone(),
        ));

        Ok(Self {
            config,
            matchmaker,
            started_at: crate::utils::current_timestamp(),
            running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn matchmaker(&self) -> Arc<Matchmaker> {
        self.matchmaker.clone()
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!(
            "Engine started: strategy {:?}, policy {:?}, search depth {}",
            self.config.matchmaking.match_strategy,
            self.config.matchmaking.preference_policy,
            self.config.matchmaking.max_interest_search_depth
        );
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("Engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Collect a stats snapshot for periodic health logging
    pub fn stats(&self) -> Result<ServiceStats> {
        let engine_stats = self.matchmaker.stats()?;
        let uptime = crate::utils::current_timestamp() - self.started_at;
        Ok(ServiceStats {
            pairs_committed: engine_stats.pairs_committed,
            users_enqueued: engine_stats.users_enqueued,
            sessions_ended: engine_stats.sessions_ended,
            users_waiting: engine_stats.users_waiting,
            uptime_seconds: uptime.num_seconds(),
        })
    }
}
