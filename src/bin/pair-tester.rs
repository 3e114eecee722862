//! Pair Tester CLI Tool
//!
//! Command-line tool for exercising the matchmaking engine with simulated
//! user populations, without any chat transport attached.
//!
//! Usage:
//!   cargo run --bin pair-tester -- --help
//!   cargo run --bin pair-tester simulate --users 200 --rounds 20
//!   cargo run --bin pair-tester simulate --strategy best-of-pool --strict
//!   cargo run --bin pair-tester churn --users 50 --rounds 100

use anyhow::Result;
use clap::{Parser, Subcommand};
use duet::config::app::{parse_policy, parse_strategy, AppConfig};
use duet::engine::{ConnectOutcome, Matchmaker};
use duet::service::AppState;
use duet::types::UserId;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pair-tester")]
#[command(about = "Simulation tool for the duet matchmaking engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Match strategy (first-available, interest-depth, best-of-pool)
    #[arg(long, default_value = "interest-depth")]
    strategy: String,

    /// Require complete profiles before pairing
    #[arg(long)]
    strict: bool,

    /// Seed for the deterministic simulation
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a population through repeated connect rounds
    Simulate {
        /// Number of simulated users (at least 1)
        #[arg(short, long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
        users: u64,
        /// Number of connect rounds
        #[arg(short, long, default_value = "10")]
        rounds: u64,
    },
    /// Alternate connect/next/stop churn across the population
    Churn {
        /// Number of simulated users (at least 1)
        #[arg(short, long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
        users: u64,
        /// Number of churn rounds
        #[arg(short, long, default_value = "50")]
        rounds: u64,
    },
}

/// Deterministic xorshift generator so runs are reproducible by seed
struct SimRng(u64);

impl SimRng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next() % items.len() as u64) as usize]
    }
}

const GENDERS: &[&str] = &["male", "female", "other"];
const PREFERENCES: &[&str] = &["male", "female", "any"];
const INTERESTS: &[&str] = &["music", "books", "travel", "games", "tech", "sports"];

/// Give each simulated user a randomized profile
fn populate(engine: &Matchmaker, users: u64, rng: &mut SimRng) -> Result<()> {
    for id in 1..=users as UserId {
        engine.set_gender(id, GENDERS[(rng.next() % 3) as usize])?;
        engine.set_preference(id, PREFERENCES[(rng.next() % 3) as usize])?;

        // Roughly half the population declares interests.
        if rng.next() % 2 == 0 {
            let count = 1 + (rng.next() % 3) as usize;
            let tags: Vec<String> = (0..count)
                .map(|_| rng.pick(INTERESTS).to_string())
                .collect();
            engine.set_interests(id, &tags)?;
        }
    }
    Ok(())
}

async fn run_simulate(engine: Arc<Matchmaker>, users: u64, rounds: u64, rng: &mut SimRng) -> Result<()> {
    let mut paired = 0u64;
    let mut searching = 0u64;

    for round in 1..=rounds {
        for id in 1..=users as UserId {
            match engine.connect(id).await {
                Ok(ConnectOutcome::Paired { .. }) => paired += 1,
                Ok(ConnectOutcome::Searching) => searching += 1,
                Err(_) => {} // already connected this round
            }
        }

        // A random slice of the population moves on.
        for _ in 0..users / 4 {
            let id = 1 + (rng.next() % users) as UserId;
            let _ = engine.next(id).await;
        }

        let stats = engine.stats()?;
        println!(
            "round {:>3}: {} paired, {} searching, {} waiting now",
            round, paired, searching, stats.users_waiting
        );
    }

    Ok(())
}

async fn run_churn(engine: Arc<Matchmaker>, users: u64, rounds: u64, rng: &mut SimRng) -> Result<()> {
    for _ in 0..rounds {
        let id = 1 + (rng.next() % users) as UserId;
        match rng.next() % 4 {
            0 => {
                let _ = engine.connect(id).await;
            }
            1 => {
                let _ = engine.next(id).await;
            }
            2 => {
                let _ = engine.stop(id).await;
            }
            _ => {
                let _ = engine.report(id).await;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::default();
    config.matchmaking.match_strategy = parse_strategy(&cli.strategy)?;
    if cli.strict {
        config.matchmaking.preference_policy = parse_policy("strict")?;
    }

    let app_state = AppState::new(config)?;
    app_state.start();
    let engine = app_state.matchmaker();

    let mut rng = SimRng(cli.seed.max(1));

    match cli.command {
        Commands::Simulate { users, rounds } => {
            println!("Simulating {} users over {} rounds...", users, rounds);
            populate(&engine, users, &mut rng)?;
            run_simulate(engine.clone(), users, rounds, &mut rng).await?;
        }
        Commands::Churn { users, rounds } => {
            println!("Churning {} users over {} rounds...", users, rounds);
            populate(&engine, users, &mut rng)?;
            run_churn(engine.clone(), users, rounds, &mut rng).await?;
        }
    }

    let stats = engine.stats()?;
    println!("--- final stats ---");
    println!("pairs committed:   {}", stats.pairs_committed);
    println!("users enqueued:    {}", stats.users_enqueued);
    println!("sessions ended:    {}", stats.sessions_ended);
    println!("reports filed:     {}", stats.reports_filed);
    println!("conflicts retried: {}", stats.conflicts_retried);
    println!("stale skipped:     {}", stats.stale_entries_skipped);
    println!("still waiting:     {}", stats.users_waiting);

    app_state.stop();
    Ok(())
}
