//! Game-economy rules for MNSTR: everything that has an invariant and no I/O.
//!
//! Players collect creatures by scanning codes. Each collection pays out
//! experience (scaled by the player's level) and coins (derived from the
//! scanned code). This crate holds the rules; `mnstr-db` applies them to
//! the store.
//!
//! # Modules
//!
//! - [`levels`] -- Clamped, monotonic level -> XP threshold tables.
//! - [`reward`] -- Deterministic scan code -> coin amount derivation.
//! - [`progression`] -- Applying an XP gain to a player's (level, points).
//! - [`transaction`] -- Validated transaction construction and the
//!   pending -> completed / failed state machine.
//! - [`balance`] -- The aggregation rule that turns ledger rows into balances.
//!
//! # Usage
//!
//! ```
//! use mnstr_economy::levels::{CREATURE_LEVELS, PLAYER_LEVELS};
//! use mnstr_economy::progression::{Progress, apply_xp};
//! use mnstr_economy::reward::coins_for_scan_code;
//!
//! let start = Progress { level: 0, points: 0 };
//! let xp = CREATURE_LEVELS.threshold_for(start.level);
//! let outcome = apply_xp(&PLAYER_LEVELS, start, xp);
//!
//! assert_eq!(outcome.after.points, 50);
//! assert!(coins_for_scan_code("mnstr") >= 5);
//! ```

pub mod balance;
pub mod levels;
pub mod progression;
pub mod reward;
pub mod transaction;

// Re-export primary types at crate root.
pub use balance::balances;
pub use levels::{CREATURE_LEVELS, LevelTable, PLAYER_LEVELS};
pub use progression::{Progress, XpOutcome, apply_xp};
pub use reward::coins_for_scan_code;
pub use transaction::{TransactionBuilder, check_transition};

use mnstr_types::TransactionStatus;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the economy rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EconomyError {
    /// A required identifier was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A transaction was asked to leave a terminal state, or to re-enter
    /// `pending`.
    #[error("invalid transaction transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: TransactionStatus,
        /// Requested status.
        to: TransactionStatus,
    },

    /// A debit amount could not be negated without overflow.
    #[error("amount {amount} cannot be negated")]
    AmountOverflow {
        /// The offending amount.
        amount: i64,
    },

    /// Level table data is empty or decreasing.
    #[error("invalid level table: {0}")]
    InvalidLevelTable(&'static str),
}
