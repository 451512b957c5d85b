//! Reward replay for one player.
//!
//! Creatures are replayed in collection order through the same cascade the
//! collection workflow uses, so XP scaling follows the player's level at
//! each step. Already-rewarded creatures are skipped by the cascade itself.

use mnstr_db::{
    CascadeOutcome, CreatureStore, DbError, PlayerStore, PostgresPool, RewardCascade, WalletStore,
};
use mnstr_economy::{
    CREATURE_LEVELS, PLAYER_LEVELS, Progress, apply_xp, balances, coins_for_scan_code,
};
use mnstr_types::{PlayerId, TransactionKind};
use serde::Serialize;
use tracing::info;

use crate::cli::Cli;

/// Result of a backfill run, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// The replayed player.
    pub player_id: PlayerId,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Creatures the player owns.
    pub creatures: usize,
    /// Creatures rewarded by this run (or that would be, on a dry run).
    pub granted: usize,
    /// Creatures that had already been rewarded.
    pub already_granted: usize,
    /// XP applied by this run.
    pub xp_awarded: u64,
    /// Coins credited by this run.
    pub coins_awarded: i64,
    /// Player level after the run.
    pub level: u32,
    /// Player points after the run.
    pub points: u32,
    /// Coin balance after the run.
    pub coins: i64,
}

/// Rewards a sequence of collections would pay from a starting position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// Progress after every collection.
    pub progress: Progress,
    /// Total XP applied.
    pub xp_awarded: u64,
    /// Total coins credited.
    pub coins_awarded: i64,
    /// Collections projected.
    pub grants: usize,
}

/// Replay the cascade arithmetic without touching the store.
pub fn project<'a, I>(start: Progress, scan_codes: I) -> Projection
where
    I: IntoIterator<Item = &'a str>,
{
    scan_codes.into_iter().fold(
        Projection {
            progress: start,
            xp_awarded: 0,
            coins_awarded: 0,
            grants: 0,
        },
        |acc, code| {
            let xp = CREATURE_LEVELS.threshold_for(acc.progress.level);
            Projection {
                progress: apply_xp(&PLAYER_LEVELS, acc.progress, xp).after,
                xp_awarded: acc.xp_awarded.saturating_add(u64::from(xp)),
                coins_awarded: acc.coins_awarded.saturating_add(coins_for_scan_code(code)),
                grants: acc.grants.saturating_add(1),
            }
        },
    )
}

/// Run the backfill described by `cli`.
pub async fn run(pool: &PostgresPool, cli: &Cli) -> Result<Summary, DbError> {
    let player_id = cli.player();
    let players = PlayerStore::new(pool.pool());
    let wallets = WalletStore::new(pool.pool());
    let cascade = RewardCascade::new(pool.pool());

    let player = players.find(player_id).await?;
    let creatures = CreatureStore::new(pool.pool())
        .list_for_player(player_id)
        .await?;
    info!(
        player_id = %player_id,
        creatures = creatures.len(),
        dry_run = cli.dry_run,
        "Starting backfill"
    );

    let mut summary = Summary {
        player_id,
        dry_run: cli.dry_run,
        creatures: creatures.len(),
        granted: 0,
        already_granted: 0,
        xp_awarded: 0,
        coins_awarded: 0,
        level: player.level,
        points: player.points,
        coins: 0,
    };

    if cli.dry_run {
        let mut unrewarded = Vec::with_capacity(creatures.len());
        for creature in &creatures {
            if cascade.grant_for(creature.id).await?.is_some() {
                summary.already_granted = summary.already_granted.saturating_add(1);
            } else {
                unrewarded.push(creature.scan_code.as_str());
            }
        }

        let start = Progress {
            level: player.level,
            points: player.points,
        };
        let projection = project(start, unrewarded);
        // Read the ledger itself so the report reflects exactly the rows it saw.
        let current_coins = match wallets.find_by_player(player_id).await? {
            Some(wallet) => {
                let ledger = wallets.transactions(wallet.id).await?;
                balances(&ledger, wallet.id).of(TransactionKind::Coin)
            }
            None => 0,
        };

        summary.granted = projection.grants;
        summary.xp_awarded = projection.xp_awarded;
        summary.coins_awarded = projection.coins_awarded;
        summary.level = projection.progress.level;
        summary.points = projection.progress.points;
        summary.coins = current_coins.saturating_add(projection.coins_awarded);
        return Ok(summary);
    }

    for creature in &creatures {
        let outcome = cascade
            .on_creature_collected_within(cli.deadline(), player_id, creature.id)
            .await?;
        match outcome {
            CascadeOutcome::Granted(report) => {
                summary.granted = summary.granted.saturating_add(1);
                summary.xp_awarded = summary
                    .xp_awarded
                    .saturating_add(u64::from(report.grant.xp_awarded));
                summary.coins_awarded = summary
                    .coins_awarded
                    .saturating_add(report.grant.coins_awarded);
                info!(
                    creature_id = %creature.id,
                    xp = report.grant.xp_awarded,
                    coins = report.grant.coins_awarded,
                    "Granted"
                );
            }
            CascadeOutcome::AlreadyGranted(_) => {
                summary.already_granted = summary.already_granted.saturating_add(1);
            }
        }
    }

    let player = players.find(player_id).await?;
    summary.level = player.level;
    summary.points = player.points;
    summary.coins = match wallets.find_by_player(player_id).await? {
        Some(wallet) => wallets.coins(wallet.id).await?,
        None => 0,
    };

    info!(
        player_id = %player_id,
        granted = summary.granted,
        already_granted = summary.already_granted,
        level = summary.level,
        coins = summary.coins,
        "Backfill finished"
    );
    Ok(summary)
}
