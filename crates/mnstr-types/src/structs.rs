//! Core record structs of the economy.
//!
//! These are the domain views of the `users`, `wallets`, `transactions`,
//! `mnstrs` and `reward_grants` rows. None of them carries a stored balance:
//! balances are always aggregated from completed transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{TransactionKind, TransactionStatus};
use crate::ids::{CreatureId, PlayerId, TransactionId, WalletId};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player's economy-relevant state.
///
/// Credentials and contact details live with the session layer and are not
/// modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Name shown to other players.
    pub display_name: String,
    /// Current level; never exceeds the player level table's last index.
    pub level: u32,
    /// XP accumulated towards the next level.
    pub points: u32,
    /// Threshold for `level + 1`. Derived on read, never persisted.
    pub points_to_next_level: u32,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Set when the account is archived.
    pub archived_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// Per-player ledger owner. Exactly zero or one exists per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet identifier.
    pub id: WalletId,
    /// The owning player (unique across wallets).
    pub player_id: PlayerId,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Wallets are never deleted, only archived.
    pub archived_at: Option<DateTime<Utc>>,
}

/// Coin and cash totals of a wallet at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    /// Sum of completed coin transactions.
    pub coins: i64,
    /// Sum of completed cash transactions.
    pub cash: i64,
}

impl Balances {
    /// Total for a single currency.
    pub const fn of(&self, kind: TransactionKind) -> i64 {
        match kind {
            TransactionKind::Coin => self.coins,
            TransactionKind::Cash => self.cash,
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One ledger entry with a lifecycle.
///
/// `amount` is signed: credits are positive, debits negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier.
    pub id: TransactionId,
    /// The wallet this entry belongs to.
    pub wallet_id: WalletId,
    /// The wallet's owner, denormalized for query convenience.
    pub player_id: PlayerId,
    /// Currency moved.
    pub kind: TransactionKind,
    /// Signed amount.
    pub amount: i64,
    /// Lifecycle state.
    pub status: TransactionStatus,
    /// Opaque audit payload.
    pub data: Option<String>,
    /// Failure reason, set when the entry fails.
    pub error_message: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

/// A creature collected by scanning a code.
///
/// Its fields are inert to the economy apart from `scan_code`, which seeds
/// the coin reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    /// Unique creature identifier.
    pub id: CreatureId,
    /// The collecting player.
    pub player_id: PlayerId,
    /// Creature name.
    pub name: String,
    /// Creature description.
    pub description: String,
    /// The scanned QR payload.
    pub scan_code: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Record of the rewards paid out for one creature.
///
/// At most one exists per creature; its presence makes the reward cascade a
/// no-op on replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardGrant {
    /// The rewarded creature.
    pub creature_id: CreatureId,
    /// The rewarded player.
    pub player_id: PlayerId,
    /// XP applied to the player.
    pub xp_awarded: u32,
    /// Coins credited to the wallet.
    pub coins_awarded: i64,
    /// The completed coin transaction.
    pub transaction_id: TransactionId,
    /// When the grant was recorded.
    pub created_at: DateTime<Utc>,
}
