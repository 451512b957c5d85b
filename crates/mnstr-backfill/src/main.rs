//! Operator tool that replays collection rewards for one player.
//!
//! Players whose creatures were collected before the reward cascade existed
//! (or whose cascade failed) never received XP and coins for them. This
//! binary runs the cascade for each of the player's creatures in
//! collection order. Rewards are recorded per creature, so a creature is
//! never paid twice no matter how often the tool runs.
//!
//! ```text
//! mnstr-backfill --player-id <UUID> [--database-url URL] [--deadline-ms 5000] [--dry-run]
//! ```
//!
//! Without `--database-url` the connection comes from `DATABASE_URL`.
//!
//! ```text
//! DATABASE_URL=postgresql://... mnstr-backfill --player-id <UUID>
//! ```
//!
//! The summary is printed to stdout as JSON; progress goes to the log.

mod backfill;
mod cli;

use anyhow::Context;
use clap::Parser;
use mnstr_db::{PostgresConfig, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, connection, migration or the replay
/// itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(player_id = %cli.player_id, dry_run = cli.dry_run, "mnstr-backfill starting");

    // An explicit URL overrides DATABASE_URL; pool sizing always comes from the environment.
    let config = cli
        .database_url
        .as_deref()
        .map_or_else(PostgresConfig::from_env, |url| {
            PostgresConfig::from_lookup(|name| {
                if name == "DATABASE_URL" {
                    Some(url.to_owned())
                } else {
                    std::env::var(name).ok()
                }
            })
        })
        .context("invalid database configuration")?;

    let pool = PostgresPool::connect(&config)
        .await
        .context("failed to connect to PostgreSQL")?;
    pool.run_migrations()
        .await
        .context("failed to run migrations")?;

    let result = backfill::run(&pool, &cli).await;
    pool.close().await;

    let summary =
        result.with_context(|| format!("backfill for player {} failed", cli.player_id))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to encode summary")?
    );
    Ok(())
}
