//! `PostgreSQL` data layer for the MNSTR game economy.
//!
//! Applies the rules of `mnstr-economy` to persisted players, wallets and
//! transactions. Consistency across concurrent requests comes from the
//! store itself: the one-wallet-per-player unique constraint, conditional
//! status updates, row locks on players and one database transaction per
//! multi-step operation. There is no in-process shared state.
//!
//! # Architecture
//!
//! ```text
//! Collection workflow
//!     |
//!     +-- CreatureStore::create
//!     +-- RewardCascade::on_creature_collected  (one DB transaction)
//!             |-- PlayerStore   (lock, apply XP)
//!             |-- WalletStore   (provision, credit coins)
//!             +-- reward_grants (at most once per creature)
//!
//! Reporting / API
//!     +-- WalletStore::{coins, cash, balances, transactions}
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and configuration
//! - [`player_store`] -- Player level and points
//! - [`wallet_store`] -- Wallet provisioning, credits, debits, balances
//! - [`transaction_store`] -- Ledger entries and their lifecycle
//! - [`creature_store`] -- Collected creature records
//! - [`cascade`] -- The atomic, replay-safe reward cascade
//! - [`deadline`] -- Per-call deadlines
//! - [`error`] -- Shared error types

pub mod cascade;
pub mod creature_store;
pub mod deadline;
pub mod error;
pub mod player_store;
pub mod postgres;
pub mod transaction_store;
pub mod wallet_store;

// Re-export primary types for convenience.
pub use cascade::{CascadeOutcome, CascadeReport, RewardCascade, RewardGrantRow};
pub use creature_store::{CreatureRow, CreatureStore};
pub use error::DbError;
pub use player_store::{PlayerRow, PlayerStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use transaction_store::{TransactionRow, TransactionStore};
pub use wallet_store::{MAX_PROVISION_ATTEMPTS, WalletRow, WalletStore};
