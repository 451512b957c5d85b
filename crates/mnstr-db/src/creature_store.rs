//! Collected creature records (`mnstrs`).
//!
//! Inserting a creature does not pay anything out; the collection workflow
//! calls [`crate::RewardCascade`] afterwards.

use chrono::{DateTime, Utc};
use mnstr_types::{Creature, CreatureId, PlayerId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, is_foreign_key_violation, require_id};

/// Columns selected for every creature read.
const CREATURE_COLUMNS: &str =
    "id, user_id, mnstr_name, mnstr_description, mnstr_qr_code, created_at, updated_at";

/// Operations on the `mnstrs` table.
pub struct CreatureStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CreatureStore<'a> {
    /// Create a new creature store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a creature collected by `player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] for a nil player id or an empty scan
    /// code, and [`DbError::NotFound`] if the player does not exist.
    pub async fn create(
        &self,
        player_id: PlayerId,
        name: &str,
        description: &str,
        scan_code: &str,
    ) -> Result<Creature, DbError> {
        require_id("player_id", player_id)?;
        if scan_code.is_empty() {
            return Err(DbError::Validation("scan code must not be empty".to_owned()));
        }

        let id = CreatureId::new();
        let row = sqlx::query_as::<_, CreatureRow>(&format!(
            "INSERT INTO mnstrs (id, user_id, mnstr_name, mnstr_description, mnstr_qr_code)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CREATURE_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(player_id.into_inner())
        .bind(name)
        .bind(description)
        .bind(scan_code)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::not_found("player", player_id)
            } else {
                DbError::Postgres(e)
            }
        })?;

        tracing::debug!(creature_id = %id, player_id = %player_id, "Inserted creature");
        Ok(row.into())
    }

    /// Fetch one creature.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such creature exists.
    pub async fn find(&self, id: CreatureId) -> Result<Creature, DbError> {
        require_id("creature_id", id)?;
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("creature", id))
    }

    /// The player's earliest creature collected from `scan_code`, if any.
    pub async fn find_by_scan_code_for_player(
        &self,
        player_id: PlayerId,
        scan_code: &str,
    ) -> Result<Option<Creature>, DbError> {
        let uuid = require_id("player_id", player_id)?;
        let row = sqlx::query_as::<_, CreatureRow>(&format!(
            "SELECT {CREATURE_COLUMNS} FROM mnstrs
             WHERE user_id = $1 AND mnstr_qr_code = $2 AND archived_at IS NULL
             ORDER BY created_at
             LIMIT 1"
        ))
        .bind(uuid)
        .bind(scan_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Creature::from))
    }

    /// All of a player's creatures, in collection order.
    pub async fn list_for_player(&self, player_id: PlayerId) -> Result<Vec<Creature>, DbError> {
        let uuid = require_id("player_id", player_id)?;
        let rows = sqlx::query_as::<_, CreatureRow>(&format!(
            "SELECT {CREATURE_COLUMNS} FROM mnstrs
             WHERE user_id = $1 AND archived_at IS NULL
             ORDER BY created_at, id"
        ))
        .bind(uuid)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Creature::from).collect())
    }
}

/// Read one creature on `conn`, if present.
pub(crate) async fn fetch(
    conn: &mut PgConnection,
    id: CreatureId,
) -> Result<Option<Creature>, DbError> {
    let row = sqlx::query_as::<_, CreatureRow>(&format!(
        "SELECT {CREATURE_COLUMNS} FROM mnstrs WHERE id = $1"
    ))
    .bind(id.into_inner())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Creature::from))
}

/// A row from the `mnstrs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreatureRow {
    /// Creature UUID.
    pub id: Uuid,
    /// Collecting player UUID.
    pub user_id: Uuid,
    /// Creature name.
    pub mnstr_name: String,
    /// Creature description.
    pub mnstr_description: String,
    /// Scanned QR payload.
    pub mnstr_qr_code: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<CreatureRow> for Creature {
    fn from(row: CreatureRow) -> Self {
        Self {
            id: CreatureId::from(row.id),
            player_id: PlayerId::from(row.user_id),
            name: row.mnstr_name,
            description: row.mnstr_description,
            scan_code: row.mnstr_qr_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
