//! Balance aggregation over ledger rows.
//!
//! A balance is never stored. It is the sum of `amount` over the wallet's
//! `completed` transactions of one kind; `pending` and `failed` rows never
//! contribute, and no rows means zero. The data layer evaluates the same
//! rule in SQL (`SUM ... WHERE transaction_status = 'completed'`).

use mnstr_types::{Balances, Transaction, TransactionKind, TransactionStatus, WalletId};

fn counts_towards(tx: &Transaction, wallet_id: WalletId) -> bool {
    tx.wallet_id == wallet_id && tx.status == TransactionStatus::Completed
}

/// Coin and cash balances of `wallet_id` over a set of ledger rows.
///
/// Rows of other wallets are ignored, so a mixed slice is fine.
pub fn balances<'a, I>(transactions: I, wallet_id: WalletId) -> Balances
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|tx| counts_towards(tx, wallet_id))
        .fold(Balances::default(), |mut totals, tx| {
            match tx.kind {
                TransactionKind::Coin => totals.coins = totals.coins.saturating_add(tx.amount),
                TransactionKind::Cash => totals.cash = totals.cash.saturating_add(tx.amount),
            }
            totals
        })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mnstr_types::{PlayerId, TransactionId};

    use super::*;

    fn entry(
        wallet_id: WalletId,
        kind: TransactionKind,
        amount: i64,
        status: TransactionStatus,
    ) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: TransactionId::new(),
            wallet_id,
            player_id: PlayerId::new(),
            kind,
            amount,
            status,
            data: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_completed_rows_count() {
        let wallet = WalletId::new();
        let ledger = [
            entry(wallet, TransactionKind::Coin, 100, TransactionStatus::Completed),
            entry(wallet, TransactionKind::Coin, -30, TransactionStatus::Completed),
            entry(wallet, TransactionKind::Coin, 10, TransactionStatus::Pending),
        ];
        assert_eq!(balances(&ledger, wallet).of(TransactionKind::Coin), 70);
    }

    #[test]
    fn failed_rows_never_count() {
        let wallet = WalletId::new();
        let ledger = [
            entry(wallet, TransactionKind::Cash, 500, TransactionStatus::Failed),
            entry(wallet, TransactionKind::Cash, 20, TransactionStatus::Completed),
        ];
        assert_eq!(balances(&ledger, wallet).of(TransactionKind::Cash), 20);
    }

    #[test]
    fn kinds_and_wallets_are_separate() {
        let wallet = WalletId::new();
        let other = WalletId::new();
        let ledger = [
            entry(wallet, TransactionKind::Coin, 40, TransactionStatus::Completed),
            entry(wallet, TransactionKind::Cash, 7, TransactionStatus::Completed),
            entry(other, TransactionKind::Coin, 1_000, TransactionStatus::Completed),
        ];
        assert_eq!(
            balances(&ledger, wallet),
            Balances { coins: 40, cash: 7 }
        );
        assert_eq!(balances(&ledger, other).of(TransactionKind::Cash), 0);
    }

    #[test]
    fn empty_ledger_is_zero() {
        let ledger: [Transaction; 0] = [];
        assert_eq!(balances(&ledger, WalletId::new()), Balances::default());
    }

    #[test]
    fn debits_may_drive_balance_negative() {
        let wallet = WalletId::new();
        let ledger = [
            entry(wallet, TransactionKind::Coin, 5, TransactionStatus::Completed),
            entry(wallet, TransactionKind::Coin, -50, TransactionStatus::Completed),
        ];
        assert_eq!(balances(&ledger, wallet).of(TransactionKind::Coin), -45);
    }
}
