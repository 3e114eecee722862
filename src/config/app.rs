//! Main application configuration
//!
//! This module defines the primary configuration structures for the duet
//! matchmaking engine, including environment variable loading, TOML file
//! loading, and validation.

use crate::matching::{MatchStrategy, MatchingConfig, PreferencePolicy};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Interval between periodic stats log lines in seconds
    pub stats_interval_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingSettings {
    /// Candidate selection strategy
    pub match_strategy: MatchStrategy,
    /// How unset gender/preference fields are treated
    pub preference_policy: PreferencePolicy,
    /// Maximum candidates inspected in the interest search
    pub max_interest_search_depth: usize,
    /// Maximum interests a user may declare
    pub max_selected_interests: usize,
    /// Report count at which a new partner receives an advisory caution
    pub report_warning_threshold: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "duet".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 30,
            stats_interval_seconds: 60,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            match_strategy: MatchStrategy::InterestDepth,
            preference_policy: PreferencePolicy::PermissiveAny,
            max_interest_search_depth: 5,
            max_selected_interests: 3,
            report_warning_threshold: 3,
        }
    }
}

impl MatchmakingSettings {
    /// Project the settings the matcher strategies consume
    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            preference_policy: self.preference_policy,
            max_interest_search_depth: self.max_interest_search_depth,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to
    /// defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(interval) = env::var("STATS_INTERVAL_SECONDS") {
            config.service.stats_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid STATS_INTERVAL_SECONDS value: {}", interval))?;
        }

        // Matchmaking settings
        if let Ok(strategy) = env::var("MATCH_STRATEGY") {
            config.matchmaking.match_strategy = parse_strategy(&strategy)?;
        }
        if let Ok(policy) = env::var("PREFERENCE_POLICY") {
            config.matchmaking.preference_policy = parse_policy(&policy)?;
        }
        if let Ok(depth) = env::var("MAX_INTEREST_SEARCH_DEPTH") {
            config.matchmaking.max_interest_search_depth = depth
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_INTEREST_SEARCH_DEPTH value: {}", depth))?;
        }
        if let Ok(cap) = env::var("MAX_SELECTED_INTERESTS") {
            config.matchmaking.max_selected_interests = cap
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_SELECTED_INTERESTS value: {}", cap))?;
        }
        if let Ok(threshold) = env::var("REPORT_WARNING_THRESHOLD") {
            config.matchmaking.report_warning_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("Invalid REPORT_WARNING_THRESHOLD value: {}", threshold))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get stats interval as Duration
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.service.stats_interval_seconds)
    }
}

/// Parse a match strategy token from env/CLI
pub fn parse_strategy(s: &str) -> Result<MatchStrategy> {
    match s.trim().to_lowercase().as_str() {
        "first_available" | "first-available" => Ok(MatchStrategy::FirstAvailable),
        "interest_depth" | "interest-depth" => Ok(MatchStrategy::InterestDepth),
        "best_of_pool" | "best-of-pool" => Ok(MatchStrategy::BestOfPool),
        _ => Err(anyhow!("Invalid match strategy: {}", s)),
    }
}

/// Parse a preference policy token from env/CLI
pub fn parse_policy(s: &str) -> Result<PreferencePolicy> {
    match s.trim().to_lowercase().as_str() {
        "permissive" | "permissive_any" => Ok(PreferencePolicy::PermissiveAny),
        "strict" | "strict_preference_required" => Ok(PreferencePolicy::StrictPreferenceRequired),
        _ => Err(anyhow!("Invalid preference policy: {}", s)),
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.service.stats_interval_seconds == 0 {
        return Err(anyhow!("Stats interval must be greater than 0"));
    }

    // Validate matchmaking settings
    if config.matchmaking.max_interest_search_depth == 0 {
        return Err(anyhow!("Interest search depth must be greater than 0"));
    }
    if config.matchmaking.max_selected_interests == 0 {
        return Err(anyhow!("Interest cap must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.matchmaking.max_interest_search_depth, 5);
        assert_eq!(config.matchmaking.max_selected_interests, 3);
        assert_eq!(config.matchmaking.report_warning_threshold, 3);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let mut config = AppConfig::default();
        config.matchmaking.max_interest_search_depth = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_strategy_and_policy_parsing() {
        assert_eq!(
            parse_strategy("best-of-pool").unwrap(),
            MatchStrategy::BestOfPool
        );
        assert_eq!(
            parse_strategy("interest_depth").unwrap(),
            MatchStrategy::InterestDepth
        );
        assert!(parse_strategy("optimal").is_err());

        assert_eq!(
            parse_policy("strict").unwrap(),
            PreferencePolicy::StrictPreferenceRequired
        );
        assert!(parse_policy("lenient").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let raw = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&raw).unwrap();
        assert_eq!(
            parsed.matchmaking.match_strategy,
            config.matchmaking.match_strategy
        );
        assert_eq!(parsed.service.name, config.service.name);
    }
}
