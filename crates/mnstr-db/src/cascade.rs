//! The reward cascade run when a player collects a creature.
//!
//! ```text
//! on_creature_collected(player, creature)
//!     |
//!     +-- BEGIN; lock player row (FOR UPDATE)
//!     +-- creature owned by player?    --> no: Validation
//!     +-- reward_grants has creature?  --> yes: AlreadyGranted, no writes
//!     +-- xp    = CREATURE_LEVELS[player.level]
//!     +-- apply_xp(PLAYER_LEVELS)        --> UPDATE users
//!     +-- coins = coins_for_scan_code(creature.scan_code)
//!     +-- provision wallet; insert + complete coin entry
//!     +-- INSERT reward_grants(creature)
//!     +-- COMMIT
//! ```
//!
//! Every step shares one database transaction, so a failure anywhere leaves
//! neither XP nor coins applied. The `reward_grants` row, keyed by creature,
//! makes a replay of the same collection a no-op.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mnstr_economy::{CREATURE_LEVELS, PLAYER_LEVELS, XpOutcome, apply_xp, coins_for_scan_code};
use mnstr_types::{CreatureId, PlayerId, RewardGrant, TransactionId, TransactionKind, WalletId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, is_unique_violation, require_id};
use crate::{creature_store, deadline, player_store, wallet_store};

/// What a cascade run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// XP and coins were applied by this run.
    Granted(CascadeReport),
    /// The creature had already been rewarded; nothing was written.
    AlreadyGranted(RewardGrant),
}

impl CascadeOutcome {
    /// The grant recorded for the creature.
    pub const fn grant(&self) -> &RewardGrant {
        match self {
            Self::Granted(report) => &report.grant,
            Self::AlreadyGranted(grant) => grant,
        }
    }

    /// Whether this run applied the rewards.
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Details of a successful cascade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    /// The grant row written.
    pub grant: RewardGrant,
    /// The player's progression change.
    pub progress: XpOutcome,
    /// The wallet credited.
    pub wallet_id: WalletId,
}

/// Applies collection rewards atomically and at most once per creature.
pub struct RewardCascade<'a> {
    pool: &'a PgPool,
}

impl<'a> RewardCascade<'a> {
    /// Create a new cascade bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reward `player_id` for collecting `creature_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the player or creature does not
    /// exist and [`DbError::Validation`] if the creature belongs to another
    /// player. Storage errors roll back every step.
    pub async fn on_creature_collected(
        &self,
        player_id: PlayerId,
        creature_id: CreatureId,
    ) -> Result<CascadeOutcome, DbError> {
        require_id("player_id", player_id)?;
        require_id("creature_id", creature_id)?;

        let mut tx = self.pool.begin().await?;

        let player = player_store::lock_player(&mut *tx, player_id).await?;

        // Ownership first: a replay by another player must not see the grant.
        let creature = creature_store::fetch(&mut *tx, creature_id)
            .await?
            .ok_or_else(|| DbError::not_found("creature", creature_id))?;
        if creature.player_id != player_id {
            return Err(DbError::Validation(format!(
                "creature {creature_id} is not owned by player {player_id}"
            )));
        }

        let existing = fetch_grant(&mut *tx, creature_id).await?;
        if let Some(grant) = existing {
            tx.rollback().await?;
            tracing::debug!(creature_id = %creature_id, "Creature already rewarded");
            return Ok(CascadeOutcome::AlreadyGranted(grant));
        }

        let xp = CREATURE_LEVELS.threshold_for(player.level);
        let progress = apply_xp(&PLAYER_LEVELS, player_store::progress_of(&player), xp);
        player_store::save_progress(&mut *tx, player_id, progress.after).await?;

        let coins = coins_for_scan_code(&creature.scan_code);
        let wallet = wallet_store::provision(&mut *tx, player_id).await?;
        let credit =
            wallet_store::post_completed(&mut *tx, &wallet, TransactionKind::Coin, coins).await?;

        let inserted = insert_grant(&mut *tx, creature_id, player_id, xp, coins, credit.id).await;
        let grant = match inserted {
            Ok(grant) => grant,
            Err(DbError::Conflict(_)) => {
                tx.rollback().await?;
                tracing::warn!(
                    creature_id = %creature_id,
                    "Concurrent reward grant; keeping the first"
                );
                let mut conn = self.pool.acquire().await?;
                let grant = fetch_grant(&mut conn, creature_id).await?.ok_or_else(|| {
                    DbError::Conflict(format!("reward grant for creature {creature_id} vanished"))
                })?;
                return Ok(CascadeOutcome::AlreadyGranted(grant));
            }
            Err(e) => return Err(e),
        };

        tx.commit().await?;

        tracing::info!(
            player_id = %player_id,
            creature_id = %creature_id,
            xp_awarded = xp,
            coins_awarded = coins,
            level = progress.after.level,
            leveled_up = progress.leveled_up(),
            "Reward cascade applied"
        );

        Ok(CascadeOutcome::Granted(CascadeReport {
            grant,
            progress,
            wallet_id: wallet.id,
        }))
    }

    /// [`RewardCascade::on_creature_collected`] under a deadline.
    ///
    /// When the deadline elapses the open database transaction is dropped
    /// and rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Timeout`] if `limit` elapses, otherwise as
    /// [`RewardCascade::on_creature_collected`].
    pub async fn on_creature_collected_within(
        &self,
        limit: Duration,
        player_id: PlayerId,
        creature_id: CreatureId,
    ) -> Result<CascadeOutcome, DbError> {
        deadline::within(
            "reward cascade",
            limit,
            self.on_creature_collected(player_id, creature_id),
        )
        .await
    }

    /// The grant recorded for a creature, if it has been rewarded.
    pub async fn grant_for(&self, creature_id: CreatureId) -> Result<Option<RewardGrant>, DbError> {
        require_id("creature_id", creature_id)?;
        let mut conn = self.pool.acquire().await?;
        fetch_grant(&mut conn, creature_id).await
    }
}

/// Read the grant for a creature on `conn`.
async fn fetch_grant(
    conn: &mut PgConnection,
    creature_id: CreatureId,
) -> Result<Option<RewardGrant>, DbError> {
    let row = sqlx::query_as::<_, RewardGrantRow>(
        r"SELECT creature_id, user_id, xp_awarded, coins_awarded, transaction_id, created_at
          FROM reward_grants
          WHERE creature_id = $1",
    )
    .bind(creature_id.into_inner())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(RewardGrant::try_from).transpose()
}

/// Record that `creature_id` has been rewarded.
async fn insert_grant(
    conn: &mut PgConnection,
    creature_id: CreatureId,
    player_id: PlayerId,
    xp: u32,
    coins: i64,
    transaction_id: TransactionId,
) -> Result<RewardGrant, DbError> {
    let row = sqlx::query_as::<_, RewardGrantRow>(
        r"INSERT INTO reward_grants
              (creature_id, user_id, xp_awarded, coins_awarded, transaction_id)
          VALUES ($1, $2, $3, $4, $5)
          RETURNING creature_id, user_id, xp_awarded, coins_awarded, transaction_id, created_at",
    )
    .bind(creature_id.into_inner())
    .bind(player_id.into_inner())
    .bind(i64::from(xp))
    .bind(coins)
    .bind(transaction_id.into_inner())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Conflict(format!("creature {creature_id} already rewarded"))
        } else {
            DbError::Postgres(e)
        }
    })?;

    row.try_into()
}

/// A row from the `reward_grants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RewardGrantRow {
    /// Rewarded creature UUID.
    pub creature_id: Uuid,
    /// Rewarded player UUID.
    pub user_id: Uuid,
    /// XP applied.
    pub xp_awarded: i64,
    /// Coins credited.
    pub coins_awarded: i64,
    /// The completed coin transaction.
    pub transaction_id: Uuid,
    /// When the grant was recorded.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RewardGrantRow> for RewardGrant {
    type Error = DbError;

    fn try_from(row: RewardGrantRow) -> Result<Self, Self::Error> {
        let xp_awarded = u32::try_from(row.xp_awarded).map_err(|e| {
            DbError::Corrupt(format!(
                "reward grant {} has xp {}: {e}",
                row.creature_id, row.xp_awarded
            ))
        })?;

        Ok(Self {
            creature_id: CreatureId::from(row.creature_id),
            player_id: PlayerId::from(row.user_id),
            xp_awarded,
            coins_awarded: row.coins_awarded,
            transaction_id: TransactionId::from(row.transaction_id),
            created_at: row.created_at,
        })
    }
}
