//! Wallet provisioning, credits/debits and balance aggregation.
//!
//! A wallet never stores a balance. Coin and cash totals are the sum of
//! the wallet's `completed` transactions of that kind, computed by
//! `PostgreSQL` at read time, so concurrent credits never race on a stored
//! total.
//!
//! Provisioning is lazy: [`WalletStore::get_or_create`] inserts with
//! `ON CONFLICT (user_id) DO NOTHING` and then reads back whichever row
//! won. The `UNIQUE (user_id)` constraint is what guarantees one wallet per
//! player; no existence pre-check is involved.

use chrono::{DateTime, Utc};
use mnstr_economy::TransactionBuilder;
use mnstr_economy::transaction::debit_amount;
use mnstr_types::{
    Balances, PlayerId, Transaction, TransactionId, TransactionKind, TransactionStatus, Wallet,
    WalletId,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, is_foreign_key_violation, is_unique_violation, require_id};
use crate::transaction_store::{self, TransactionStore};

/// Attempts [`WalletStore::get_or_create`] makes before giving up.
pub const MAX_PROVISION_ATTEMPTS: u32 = 3;

/// Columns selected for every wallet read.
const WALLET_COLUMNS: &str = "id, user_id, created_at, updated_at, archived_at";

/// Operations on the `wallets` table and the balances derived from
/// `transactions`.
pub struct WalletStore<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletStore<'a> {
    /// Create a new wallet store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Provisioning
    // =========================================================================

    /// Insert a wallet for `player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the player already owns a wallet and
    /// [`DbError::NotFound`] if the player does not exist.
    pub async fn create(&self, player_id: PlayerId) -> Result<Wallet, DbError> {
        require_id("player_id", player_id)?;
        let id = WalletId::new();

        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "INSERT INTO wallets (id, user_id) VALUES ($1, $2) RETURNING {WALLET_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(player_id.into_inner())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict(format!("player {player_id} already owns a wallet"))
            } else if is_foreign_key_violation(&e) {
                DbError::not_found("player", player_id)
            } else {
                DbError::Postgres(e)
            }
        })?;

        tracing::info!(wallet_id = %id, player_id = %player_id, "Created wallet");
        Ok(row.into())
    }

    /// Return the player's wallet, creating it if it does not exist yet.
    ///
    /// Safe to call concurrently: every caller observes the same row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the player does not exist and
    /// [`DbError::WalletProvisioning`] if no wallet could be observed after
    /// [`MAX_PROVISION_ATTEMPTS`] attempts.
    pub async fn get_or_create(&self, player_id: PlayerId) -> Result<Wallet, DbError> {
        require_id("player_id", player_id)?;
        let mut conn = self.pool.acquire().await?;
        provision(&mut conn, player_id).await
    }

    /// The player's wallet, if one exists.
    pub async fn find_by_player(&self, player_id: PlayerId) -> Result<Option<Wallet>, DbError> {
        require_id("player_id", player_id)?;
        let mut conn = self.pool.acquire().await?;
        fetch_by_player(&mut conn, player_id).await
    }

    /// Fetch a wallet by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such wallet exists.
    pub async fn find(&self, id: WalletId) -> Result<Wallet, DbError> {
        let uuid = require_id("wallet_id", id)?;
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1"
        ))
        .bind(uuid)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("wallet", id))?;

        Ok(row.into())
    }

    /// Mark a wallet archived. Archiving twice keeps the first timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such wallet exists.
    pub async fn archive(&self, id: WalletId) -> Result<Wallet, DbError> {
        let uuid = require_id("wallet_id", id)?;
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "UPDATE wallets
             SET archived_at = COALESCE(archived_at, now()), updated_at = now()
             WHERE id = $1
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(uuid)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("wallet", id))?;

        tracing::info!(wallet_id = %id, "Archived wallet");
        Ok(row.into())
    }

    // =========================================================================
    // Credits and debits
    // =========================================================================

    /// Credit coins. The entry is inserted and completed atomically.
    pub async fn add_coins(&self, wallet: &Wallet, amount: i64) -> Result<Transaction, DbError> {
        self.post(wallet, TransactionKind::Coin, amount).await
    }

    /// Credit cash. The entry is inserted and completed atomically.
    pub async fn add_cash(&self, wallet: &Wallet, amount: i64) -> Result<Transaction, DbError> {
        self.post(wallet, TransactionKind::Cash, amount).await
    }

    /// Debit coins. No balance check is made; the balance may go negative.
    pub async fn remove_coins(&self, wallet: &Wallet, amount: i64) -> Result<Transaction, DbError> {
        self.post(wallet, TransactionKind::Coin, debit_amount(amount)?)
            .await
    }

    /// Debit cash. No balance check is made; the balance may go negative.
    pub async fn remove_cash(&self, wallet: &Wallet, amount: i64) -> Result<Transaction, DbError> {
        self.post(wallet, TransactionKind::Cash, debit_amount(amount)?)
            .await
    }

    /// Insert a signed entry and complete it in one database transaction.
    async fn post(
        &self,
        wallet: &Wallet,
        kind: TransactionKind,
        amount: i64,
    ) -> Result<Transaction, DbError> {
        let mut tx = self.pool.begin().await?;
        let posted = post_completed(&mut *tx, wallet, kind, amount).await?;
        tx.commit().await?;
        Ok(posted)
    }

    // =========================================================================
    // Balances and history
    // =========================================================================

    /// Sum of completed coin entries; zero when there are none.
    pub async fn coins(&self, wallet_id: WalletId) -> Result<i64, DbError> {
        self.balance(wallet_id, TransactionKind::Coin).await
    }

    /// Sum of completed cash entries; zero when there are none.
    pub async fn cash(&self, wallet_id: WalletId) -> Result<i64, DbError> {
        self.balance(wallet_id, TransactionKind::Cash).await
    }

    /// Sum of completed entries of one kind.
    pub async fn balance(
        &self,
        wallet_id: WalletId,
        kind: TransactionKind,
    ) -> Result<i64, DbError> {
        let uuid = require_id("wallet_id", wallet_id)?;
        let total = sqlx::query_scalar::<_, i64>(
            r"SELECT COALESCE(SUM(transaction_amount), 0)::BIGINT
              FROM transactions
              WHERE wallet_id = $1
                AND transaction_type = $2
                AND transaction_status = 'completed'",
        )
        .bind(uuid)
        .bind(kind.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    /// Coin and cash totals in one aggregation.
    pub async fn balances(&self, wallet_id: WalletId) -> Result<Balances, DbError> {
        let uuid = require_id("wallet_id", wallet_id)?;
        let (coins, cash) = sqlx::query_as::<_, (i64, i64)>(
            r"SELECT
                COALESCE(SUM(transaction_amount)
                         FILTER (WHERE transaction_type = 'coin'), 0)::BIGINT,
                COALESCE(SUM(transaction_amount)
                         FILTER (WHERE transaction_type = 'cash'), 0)::BIGINT
              FROM transactions
              WHERE wallet_id = $1 AND transaction_status = 'completed'",
        )
        .bind(uuid)
        .fetch_one(self.pool)
        .await?;

        Ok(Balances { coins, cash })
    }

    /// Every entry of the wallet, oldest first.
    pub async fn transactions(&self, wallet_id: WalletId) -> Result<Vec<Transaction>, DbError> {
        TransactionStore::new(self.pool)
            .list_for_wallet(wallet_id)
            .await
    }

    /// One entry of this wallet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the entry does not exist or belongs
    /// to another wallet.
    pub async fn transaction(
        &self,
        wallet_id: WalletId,
        id: TransactionId,
    ) -> Result<Transaction, DbError> {
        let tx = TransactionStore::new(self.pool).find(id).await?;
        if tx.wallet_id != wallet_id {
            return Err(DbError::not_found("transaction", id));
        }
        Ok(tx)
    }
}

/// Find-or-insert the player's wallet on `conn`.
///
/// Works inside a caller's database transaction as well as on a bare
/// connection.
pub(crate) async fn provision(
    conn: &mut PgConnection,
    player_id: PlayerId,
) -> Result<Wallet, DbError> {
    for attempt in 1..=MAX_PROVISION_ATTEMPTS {
        let inserted = sqlx::query_as::<_, WalletRow>(&format!(
            "INSERT INTO wallets (id, user_id) VALUES ($1, $2)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(WalletId::new().into_inner())
        .bind(player_id.into_inner())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::not_found("player", player_id)
            } else {
                DbError::Postgres(e)
            }
        })?;

        if let Some(row) = inserted {
            let wallet = Wallet::from(row);
            tracing::info!(wallet_id = %wallet.id, player_id = %player_id, "Provisioned wallet");
            return Ok(wallet);
        }

        if let Some(wallet) = fetch_by_player(conn, player_id).await? {
            return Ok(wallet);
        }

        tracing::warn!(
            player_id = %player_id,
            attempt,
            "Wallet conflict but no row visible; retrying"
        );
    }

    Err(DbError::WalletProvisioning {
        player_id,
        attempts: MAX_PROVISION_ATTEMPTS,
    })
}

/// Read the player's wallet on `conn`.
pub(crate) async fn fetch_by_player(
    conn: &mut PgConnection,
    player_id: PlayerId,
) -> Result<Option<Wallet>, DbError> {
    let row = sqlx::query_as::<_, WalletRow>(&format!(
        "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1"
    ))
    .bind(player_id.into_inner())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Wallet::from))
}

/// Insert a pending entry for `wallet` and complete it on `conn`.
pub(crate) async fn post_completed(
    conn: &mut PgConnection,
    wallet: &Wallet,
    kind: TransactionKind,
    amount: i64,
) -> Result<Transaction, DbError> {
    let pending = TransactionBuilder::new(wallet.id, wallet.player_id)
        .kind(kind)
        .amount(amount)
        .build()?;

    let inserted = transaction_store::insert(&mut *conn, &pending).await?;
    let completed =
        transaction_store::transition(conn, inserted.id, TransactionStatus::Completed, None).await?;

    tracing::debug!(
        wallet_id = %wallet.id,
        transaction_id = %completed.id,
        kind = kind.as_str(),
        amount,
        "Posted completed transaction"
    );
    Ok(completed)
}

/// A row from the `wallets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WalletRow {
    /// Wallet UUID.
    pub id: Uuid,
    /// Owning player UUID.
    pub user_id: Uuid,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Archival time, if archived.
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Self {
            id: WalletId::from(row.id),
            player_id: PlayerId::from(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        }
    }
}
