//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use mnstr_types::PlayerId;
use uuid::Uuid;

/// Replay collection rewards for one player.
#[derive(Parser, Debug)]
#[command(name = "mnstr-backfill")]
#[command(version)]
#[command(about = "Replay collection rewards for a player's already-collected creatures")]
#[command(long_about = "Runs the reward cascade for every creature the player has collected.\n\n\
    Creatures that were already rewarded are skipped, so the tool is safe to run \
    repeatedly. Use --dry-run to see what would be granted without writing.")]
pub struct Cli {
    /// Player whose creatures are replayed
    #[arg(long)]
    pub player_id: Uuid,

    /// `PostgreSQL` connection URL; the `DATABASE_*` environment is used when omitted
    #[arg(long)]
    pub database_url: Option<String>,

    /// Deadline for each creature's cascade, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub deadline_ms: u64,

    /// Report what would be granted without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// The player as a typed id.
    pub const fn player(&self) -> PlayerId {
        PlayerId(self.player_id)
    }

    /// Per-creature deadline.
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}
