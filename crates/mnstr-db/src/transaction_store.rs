//! Ledger entry persistence and lifecycle.
//!
//! Status changes are conditional writes: the `UPDATE` only matches rows that
//! are still `pending`, so two racing callers cannot both move the same entry
//! and a terminal entry can never be moved again. When the write matches
//! nothing, the current row is re-read to report either
//! [`DbError::NotFound`] or [`DbError::InvalidTransition`].

use chrono::{DateTime, Utc};
use mnstr_economy::{TransactionBuilder, check_transition};
use mnstr_types::{
    PlayerId, Transaction, TransactionId, TransactionKind, TransactionStatus, WalletId,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, require_id};

/// Columns selected for every transaction read.
const TRANSACTION_COLUMNS: &str = "id, wallet_id, user_id, transaction_type, transaction_amount, \
     transaction_status, transaction_data, error_message, created_at, updated_at";

/// Operations on the `transactions` table.
pub struct TransactionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionStore<'a> {
    /// Create a new transaction store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new `pending` entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] if either identifier is nil or the
    /// wallet belongs to another player, and [`DbError::NotFound`] if the
    /// wallet or player does not exist.
    pub async fn create(
        &self,
        wallet_id: WalletId,
        player_id: PlayerId,
        kind: TransactionKind,
        amount: i64,
    ) -> Result<Transaction, DbError> {
        let pending = TransactionBuilder::new(wallet_id, player_id)
            .kind(kind)
            .amount(amount)
            .build()?;

        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, &pending).await
    }

    /// Fetch one entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such entry exists.
    pub async fn find(&self, id: TransactionId) -> Result<Transaction, DbError> {
        require_id("transaction_id", id)?;
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("transaction", id))
    }

    /// All entries of a wallet, oldest first.
    pub async fn list_for_wallet(&self, wallet_id: WalletId) -> Result<Vec<Transaction>, DbError> {
        let wallet_uuid = require_id("wallet_id", wallet_id)?;
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE wallet_id = $1
             ORDER BY created_at, id"
        ))
        .bind(wallet_uuid)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Move a `pending` entry to `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTransition`] if the entry is already
    /// terminal and [`DbError::NotFound`] if it does not exist.
    pub async fn complete(&self, id: TransactionId) -> Result<Transaction, DbError> {
        require_id("transaction_id", id)?;
        let mut conn = self.pool.acquire().await?;
        transition(&mut conn, id, TransactionStatus::Completed, None).await
    }

    /// Move a `pending` entry to `failed`, recording `message`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTransition`] if the entry is already
    /// terminal and [`DbError::NotFound`] if it does not exist.
    pub async fn fail(&self, id: TransactionId, message: &str) -> Result<Transaction, DbError> {
        require_id("transaction_id", id)?;
        let mut conn = self.pool.acquire().await?;
        transition(&mut conn, id, TransactionStatus::Failed, Some(message)).await
    }

    /// Replace the audit payload. Allowed in every status.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the entry does not exist.
    pub async fn update_data(
        &self,
        id: TransactionId,
        payload: &str,
    ) -> Result<Transaction, DbError> {
        require_id("transaction_id", id)?;
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "UPDATE transactions SET transaction_data = $2, updated_at = now()
             WHERE id = $1
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(payload)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("transaction", id))?;

        tracing::debug!(transaction_id = %id, "Updated transaction data");
        row.try_into()
    }
}

/// Insert a built entry.
///
/// The row is written only when `tx.player_id` owns `tx.wallet_id`, so the
/// denormalized `user_id` always agrees with `wallets.user_id`.
pub(crate) async fn insert(
    conn: &mut PgConnection,
    tx: &Transaction,
) -> Result<Transaction, DbError> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "INSERT INTO transactions
         (id, wallet_id, user_id, transaction_type, transaction_amount, transaction_status,
          transaction_data, error_message, created_at, updated_at)
         SELECT $1, w.id, w.user_id, $4, $5, $6, $7, $8, $9, $10
         FROM wallets w
         WHERE w.id = $2 AND w.user_id = $3
         RETURNING {TRANSACTION_COLUMNS}"
    ))
    .bind(tx.id.into_inner())
    .bind(tx.wallet_id.into_inner())
    .bind(tx.player_id.into_inner())
    .bind(tx.kind.as_str())
    .bind(tx.amount)
    .bind(tx.status.as_str())
    .bind(tx.data.as_deref())
    .bind(tx.error_message.as_deref())
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Err(rejected_reference(conn, tx.wallet_id, tx.player_id).await?);
    };

    tracing::debug!(
        transaction_id = %tx.id,
        wallet_id = %tx.wallet_id,
        kind = tx.kind.as_str(),
        amount = tx.amount,
        "Inserted transaction"
    );
    row.try_into()
}

/// Explain why an insert matched no wallet.
async fn rejected_reference(
    conn: &mut PgConnection,
    wallet_id: WalletId,
    player_id: PlayerId,
) -> Result<DbError, DbError> {
    let (owner, player_exists) = sqlx::query_as::<_, (Option<Uuid>, bool)>(
        r"SELECT (SELECT user_id FROM wallets WHERE id = $1),
                 EXISTS (SELECT 1 FROM users WHERE id = $2)",
    )
    .bind(wallet_id.into_inner())
    .bind(player_id.into_inner())
    .fetch_one(&mut *conn)
    .await?;

    Ok(match owner {
        None => DbError::not_found("wallet", wallet_id),
        Some(_) if !player_exists => DbError::not_found("player", player_id),
        Some(owner) => DbError::Validation(format!(
            "wallet {wallet_id} belongs to player {owner}, not {player_id}"
        )),
    })
}

/// Read one entry, if present.
pub(crate) async fn fetch(
    conn: &mut PgConnection,
    id: TransactionId,
) -> Result<Option<Transaction>, DbError> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
    ))
    .bind(id.into_inner())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Transaction::try_from).transpose()
}

/// Move a `pending` entry to a terminal status.
pub(crate) async fn transition(
    conn: &mut PgConnection,
    id: TransactionId,
    to: TransactionStatus,
    message: Option<&str>,
) -> Result<Transaction, DbError> {
    check_transition(TransactionStatus::Pending, to)?;

    let updated = sqlx::query_as::<_, TransactionRow>(&format!(
        "UPDATE transactions
         SET transaction_status = $2,
             error_message = COALESCE($3, error_message),
             updated_at = now()
         WHERE id = $1 AND transaction_status = 'pending'
         RETURNING {TRANSACTION_COLUMNS}"
    ))
    .bind(id.into_inner())
    .bind(to.as_str())
    .bind(message)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = updated {
        tracing::debug!(transaction_id = %id, status = to.as_str(), "Transaction transitioned");
        return row.try_into();
    }

    let current = fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("transaction", id))?;
    if current.status.is_terminal() {
        return Err(DbError::InvalidTransition {
            from: current.status,
            to,
        });
    }

    // Still pending yet the guarded write matched nothing: a concurrent
    // writer got in between.
    Err(DbError::Conflict(format!(
        "transaction {id} changed while moving to {to}"
    )))
}

/// A row from the `transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    /// Transaction UUID.
    pub id: Uuid,
    /// Owning wallet UUID.
    pub wallet_id: Uuid,
    /// Owning player UUID.
    pub user_id: Uuid,
    /// `coin` or `cash`.
    pub transaction_type: String,
    /// Signed amount.
    pub transaction_amount: i64,
    /// `pending`, `completed` or `failed`.
    pub transaction_status: String,
    /// Opaque audit payload.
    pub transaction_data: Option<String>,
    /// Failure reason.
    pub error_message: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let kind = row
            .transaction_type
            .parse::<TransactionKind>()
            .map_err(|e| DbError::Corrupt(format!("transaction {}: {e}", row.id)))?;
        let status = row
            .transaction_status
            .parse::<TransactionStatus>()
            .map_err(|e| DbError::Corrupt(format!("transaction {}: {e}", row.id)))?;

        Ok(Self {
            id: TransactionId::from(row.id),
            wallet_id: WalletId::from(row.wallet_id),
            player_id: PlayerId::from(row.user_id),
            kind,
            amount: row.transaction_amount,
            status,
            data: row.transaction_data,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
