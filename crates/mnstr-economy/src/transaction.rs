//! Transaction construction and lifecycle.
//!
//! Provides a [`TransactionBuilder`] that validates references before
//! producing a pending [`Transaction`], and the state machine every status
//! change goes through:
//!
//! ```text
//! pending --complete--> completed
//!    |
//!    +-----fail(msg)--> failed
//! ```
//!
//! Both targets are terminal. The audit fields (`data`, `error_message`)
//! stay writable in every state.

use chrono::Utc;

use mnstr_types::{
    PlayerId, Transaction, TransactionId, TransactionKind, TransactionStatus, WalletId,
};

use crate::EconomyError;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Validate a status change.
///
/// # Errors
///
/// Returns [`EconomyError::InvalidTransition`] unless `from` is `Pending`
/// and `to` is terminal.
pub const fn check_transition(
    from: TransactionStatus,
    to: TransactionStatus,
) -> Result<TransactionStatus, EconomyError> {
    match (from, to) {
        (TransactionStatus::Pending, TransactionStatus::Completed | TransactionStatus::Failed) => {
            Ok(to)
        }
        _ => Err(EconomyError::InvalidTransition { from, to }),
    }
}

/// Negate an amount for a debit entry.
///
/// # Errors
///
/// Returns [`EconomyError::AmountOverflow`] for `i64::MIN`.
pub const fn debit_amount(amount: i64) -> Result<i64, EconomyError> {
    match amount.checked_neg() {
        Some(negated) => Ok(negated),
        None => Err(EconomyError::AmountOverflow { amount }),
    }
}

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for new pending [`Transaction`] values.
///
/// Kind defaults to [`TransactionKind::Coin`] and amount to zero.
///
/// # Examples
///
/// ```
/// use mnstr_economy::TransactionBuilder;
/// use mnstr_types::{PlayerId, TransactionKind, TransactionStatus, WalletId};
///
/// let tx = TransactionBuilder::new(WalletId::new(), PlayerId::new())
///     .kind(TransactionKind::Cash)
///     .amount(-30)
///     .build();
///
/// assert!(tx.is_ok());
/// assert_eq!(tx.ok().map(|t| t.status), Some(TransactionStatus::Pending));
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    wallet_id: WalletId,
    player_id: PlayerId,
    kind: TransactionKind,
    amount: i64,
    data: Option<String>,
}

impl TransactionBuilder {
    /// Start building an entry for `wallet_id`, owned by `player_id`.
    pub const fn new(wallet_id: WalletId, player_id: PlayerId) -> Self {
        Self {
            wallet_id,
            player_id,
            kind: TransactionKind::Coin,
            amount: 0,
            data: None,
        }
    }

    /// Set the currency.
    #[must_use]
    pub const fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the signed amount.
    #[must_use]
    pub const fn amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    /// Attach an audit payload.
    #[must_use]
    pub fn data(mut self, data: String) -> Self {
        self.data = Some(data);
        self
    }

    /// Validate references and produce a pending [`Transaction`].
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::MissingField`] if the wallet or player id is
    /// the nil UUID.
    pub fn build(self) -> Result<Transaction, EconomyError> {
        if self.wallet_id.is_nil() {
            return Err(EconomyError::MissingField("wallet_id"));
        }
        if self.player_id.is_nil() {
            return Err(EconomyError::MissingField("player_id"));
        }

        let now = Utc::now();
        Ok(Transaction {
            id: TransactionId::new(),
            wallet_id: self.wallet_id,
            player_id: self.player_id,
            kind: self.kind,
            amount: self.amount,
            status: TransactionStatus::Pending,
            data: self.data,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Result<Transaction, EconomyError> {
        TransactionBuilder::new(WalletId::new(), PlayerId::new())
            .amount(100)
            .build()
    }

    #[test]
    fn builder_defaults_to_pending_coin() {
        let tx = pending();
        assert!(tx.is_ok());
        if let Ok(tx) = tx {
            assert_eq!(tx.kind, TransactionKind::Coin);
            assert_eq!(tx.status, TransactionStatus::Pending);
            assert_eq!(tx.amount, 100);
            assert!(tx.error_message.is_none());
        }
    }

    #[test]
    fn nil_wallet_rejected() {
        let result = TransactionBuilder::new(WalletId::nil(), PlayerId::new()).build();
        assert!(matches!(result, Err(EconomyError::MissingField("wallet_id"))));
    }

    #[test]
    fn nil_player_rejected() {
        let result = TransactionBuilder::new(WalletId::new(), PlayerId::nil()).build();
        assert!(matches!(result, Err(EconomyError::MissingField("player_id"))));
    }

    #[test]
    fn builder_carries_data() {
        let tx = TransactionBuilder::new(WalletId::new(), PlayerId::new())
            .data("{\"source\":\"scan\"}".to_owned())
            .build();
        assert_eq!(
            tx.ok().and_then(|t| t.data),
            Some("{\"source\":\"scan\"}".to_owned())
        );
    }

    #[test]
    fn transition_table() {
        use TransactionStatus::{Completed, Failed, Pending};

        assert_eq!(check_transition(Pending, Completed), Ok(Completed));
        assert_eq!(check_transition(Pending, Failed), Ok(Failed));

        for (from, to) in [
            (Pending, Pending),
            (Completed, Pending),
            (Completed, Completed),
            (Completed, Failed),
            (Failed, Pending),
            (Failed, Completed),
            (Failed, Failed),
        ] {
            assert_eq!(
                check_transition(from, to),
                Err(EconomyError::InvalidTransition { from, to }),
                "{from} -> {to} must be rejected"
            );
        }
    }

    #[test]
    fn debit_negates() {
        assert_eq!(debit_amount(30), Ok(-30));
        assert_eq!(debit_amount(-5), Ok(5));
        assert_eq!(debit_amount(0), Ok(0));
        assert_eq!(
            debit_amount(i64::MIN),
            Err(EconomyError::AmountOverflow { amount: i64::MIN })
        );
    }
}
