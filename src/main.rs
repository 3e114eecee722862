//! Main entry point for the duet matchmaking service
//!
//! Initializes configuration, logging, and the matchmaking engine, then runs
//! until a shutdown signal arrives. The chat transport is a deployment
//! concern wired in through the `ChatNotifier` trait; this shell runs the
//! engine with the log-backed notifier.

use anyhow::Result;
use clap::Parser;
use duet::config::{app::parse_policy, app::parse_strategy, AppConfig};
use duet::service::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Duet Matchmaking Service - anonymous one-on-one chat pairing
#[derive(Parser)]
#[command(
    name = "duet",
    version,
    about = "A matchmaking engine for anonymous one-on-one chat pairing",
    long_about = "Duet pairs anonymous users for one-on-one chat sessions, matching them by \
                 availability, declared gender/preference, and optional shared interests. \
                 Candidate selection strategy and preference policy are configurable."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Match strategy override
    #[arg(
        long,
        value_name = "STRATEGY",
        help = "Override match strategy (first-available, interest-depth, best-of-pool)"
    )]
    strategy: Option<String>,

    /// Require complete profiles before pairing
    #[arg(long, help = "Refuse pairing until both users declared gender and preference")]
    strict_preferences: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log engine statistics periodically while the service runs
async fn stats_task(app_state: Arc<AppState>) {
    let mut interval = tokio::time::interval(app_state.config().stats_interval());

    while app_state.is_running() {
        interval.tick().await;

        match app_state.stats() {
            Ok(stats) => {
                info!(
                    "Engine stats: {} waiting, {} pairs committed, {} sessions ended, up {}s",
                    stats.users_waiting,
                    stats.pairs_committed,
                    stats.sessions_ended,
                    stats.uptime_seconds
                );
            }
            Err(e) => {
                warn!("Failed to collect stats: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Duet Matchmaking Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Strategy: {:?}", config.matchmaking.match_strategy);
    info!("   Policy: {:?}", config.matchmaking.preference_policy);
    info!(
        "   Interest search depth: {}",
        config.matchmaking.max_interest_search_depth
    );
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(strategy) = &args.strategy {
        config.matchmaking.match_strategy = parse_strategy(strategy)?;
    }

    if args.strict_preferences {
        config.matchmaking.preference_policy = parse_policy("strict")?;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing engine components...");
    let app_state = match AppState::new(config.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    app_state.start();

    let stats_handle = {
        let app_state = app_state.clone();
        tokio::spawn(async move {
            stats_task(app_state).await;
        })
    };

    info!("Duet Matchmaking Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("Shutdown signal received, beginning graceful shutdown...");
    app_state.stop();
    stats_handle.abort();

    info!("Duet Matchmaking Service stopped");
    Ok(())
}
