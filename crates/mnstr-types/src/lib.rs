//! Shared type definitions for the MNSTR game economy.
//!
//! This crate is the single source of truth for the records that flow
//! between the pure economy rules (`mnstr-economy`) and the data layer
//! (`mnstr-db`).
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all record identifiers
//! - [`enums`] -- Transaction kind and status
//! - [`structs`] -- Player, wallet, transaction, creature and reward grant records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{TransactionKind, TransactionStatus, UnknownVariant};
pub use ids::{CreatureId, PlayerId, TransactionId, WalletId};
pub use structs::{Balances, Creature, Player, RewardGrant, Transaction, Wallet};
