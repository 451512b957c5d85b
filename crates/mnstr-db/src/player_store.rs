//! Player progression persistence.
//!
//! Only the economy-relevant columns of `users` are touched here: level,
//! points and the bookkeeping timestamps. XP is applied with the player row
//! locked (`SELECT ... FOR UPDATE`) so concurrent grants serialize instead
//! of overwriting each other.

use chrono::{DateTime, Utc};
use mnstr_economy::{PLAYER_LEVELS, Progress, XpOutcome, apply_xp};
use mnstr_types::{Player, PlayerId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, require_id};

/// Columns selected for every player read.
const PLAYER_COLUMNS: &str =
    "id, display_name, experience_level, experience_points, created_at, updated_at, archived_at";

/// Operations on the `users` table.
pub struct PlayerStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PlayerStore<'a> {
    /// Create a new player store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a player at level 0 with no points.
    ///
    /// Registration proper belongs to the session layer; this exists for
    /// seeding and tests.
    pub async fn create(&self, display_name: &str) -> Result<Player, DbError> {
        let id = PlayerId::new();
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "INSERT INTO users (id, display_name) VALUES ($1, $2) RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(display_name)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(player_id = %id, "Inserted player");
        row.try_into()
    }

    /// Fetch a player with its derived `points_to_next_level`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such player exists.
    pub async fn find(&self, id: PlayerId) -> Result<Player, DbError> {
        let id = require_id("player_id", id)?;
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("player", id))?;

        row.try_into()
    }

    /// Apply an XP gain and persist the new level and points.
    ///
    /// Runs in its own database transaction with the player row locked.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such player exists.
    pub async fn apply_xp(&self, id: PlayerId, xp_gained: u32) -> Result<XpOutcome, DbError> {
        require_id("player_id", id)?;
        let mut tx = self.pool.begin().await?;

        let player = lock_player(&mut *tx, id).await?;
        let outcome = apply_xp(&PLAYER_LEVELS, progress_of(&player), xp_gained);
        save_progress(&mut *tx, id, outcome.after).await?;

        tx.commit().await?;

        tracing::info!(
            player_id = %id,
            xp_gained,
            level = outcome.after.level,
            points = outcome.after.points,
            leveled_up = outcome.leveled_up(),
            "Applied XP"
        );
        Ok(outcome)
    }
}

/// The `(level, points)` pair of a player.
pub(crate) const fn progress_of(player: &Player) -> Progress {
    Progress {
        level: player.level,
        points: player.points,
    }
}

/// Read a player row and hold its lock until the surrounding transaction ends.
pub(crate) async fn lock_player(conn: &mut PgConnection, id: PlayerId) -> Result<Player, DbError> {
    let row = sqlx::query_as::<_, PlayerRow>(&format!(
        "SELECT {PLAYER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.into_inner())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("player", id))?;

    row.try_into()
}

/// Persist a new `(level, points)` pair.
pub(crate) async fn save_progress(
    conn: &mut PgConnection,
    id: PlayerId,
    progress: Progress,
) -> Result<(), DbError> {
    let level = i32::try_from(progress.level)
        .map_err(|e| DbError::Validation(format!("level {} out of range: {e}", progress.level)))?;

    let result = sqlx::query(
        r"UPDATE users
          SET experience_level = $2, experience_points = $3, updated_at = now()
          WHERE id = $1",
    )
    .bind(id.into_inner())
    .bind(level)
    .bind(i64::from(progress.points))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("player", id));
    }

    tracing::debug!(
        player_id = %id,
        level = progress.level,
        points = progress.points,
        "Saved player progress"
    );
    Ok(())
}

/// A row from the `users` table (economy columns only).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    /// Player UUID.
    pub id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Current level.
    pub experience_level: i32,
    /// XP towards the next level.
    pub experience_points: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Archival time, if archived.
    pub archived_at: Option<DateTime<Utc>>,
}

impl TryFrom<PlayerRow> for Player {
    type Error = DbError;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        let level = u32::try_from(row.experience_level).map_err(|e| {
            DbError::Corrupt(format!("player {} has level {}: {e}", row.id, row.experience_level))
        })?;
        let points = u32::try_from(row.experience_points).map_err(|e| {
            DbError::Corrupt(format!(
                "player {} has points {}: {e}",
                row.id, row.experience_points
            ))
        })?;

        Ok(Self {
            id: PlayerId::from(row.id),
            display_name: row.display_name,
            level,
            points,
            points_to_next_level: mnstr_economy::progression::points_to_next_level(
                &PLAYER_LEVELS,
                level,
            ),
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        })
    }
}
