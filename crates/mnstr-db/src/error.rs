//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`]. Storage failures wrap the
//! underlying [`sqlx`] error unchanged; the remaining variants classify
//! what went wrong in economy terms (not found, validation, conflict, an
//! illegal status change).

use mnstr_economy::EconomyError;
use mnstr_types::{PlayerId, TransactionStatus};
use uuid::Uuid;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (`player`, `wallet`, `transaction`, `creature`).
        entity: &'static str,
        /// The identifier that was looked up.
        id: Uuid,
    },

    /// A required identifier or field was missing or unusable.
    #[error("validation error: {0}")]
    Validation(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A transaction was asked to leave a terminal state.
    #[error("invalid transaction transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the row was in.
        from: TransactionStatus,
        /// Status that was requested.
        to: TransactionStatus,
    },

    /// Wallet provisioning gave up without observing a wallet row.
    #[error("could not provision wallet for player {player_id} after {attempts} attempts")]
    WalletProvisioning {
        /// The player whose wallet was requested.
        player_id: PlayerId,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value cannot be mapped to the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The caller's deadline elapsed before the operation finished.
    #[error("{operation} timed out after {deadline_ms}ms")]
    Timeout {
        /// Name of the operation that was cut off.
        operation: &'static str,
        /// The deadline that elapsed, in milliseconds.
        deadline_ms: u64,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Shorthand for a [`DbError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether this is a [`DbError::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<EconomyError> for DbError {
    fn from(err: EconomyError) -> Self {
        match err {
            EconomyError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            EconomyError::MissingField(_) | EconomyError::AmountOverflow { .. } => {
                Self::Validation(err.to_string())
            }
            EconomyError::InvalidLevelTable(_) => Self::Corrupt(err.to_string()),
        }
    }
}

/// Whether `err` is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether `err` is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Reject the nil UUID, which stands in for an empty identifier.
pub(crate) fn require_id(field: &'static str, id: impl Into<Uuid>) -> Result<Uuid, DbError> {
    let id = id.into();
    if id.is_nil() {
        return Err(EconomyError::MissingField(field).into());
    }
    Ok(id)
}
