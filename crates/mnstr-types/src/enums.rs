//! Enumeration types for the MNSTR economy.
//!
//! Both enums are persisted as lowercase text in the `transactions` table
//! (`transaction_type`, `transaction_status`). [`core::str::FromStr`] and
//! `as_str` are the only mapping between the two representations.

use serde::{Deserialize, Serialize};

/// The currency a transaction moves.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Soft currency earned in play (creature rewards).
    #[default]
    Coin,
    /// Hard currency.
    Cash,
}

impl TransactionKind {
    /// Database / wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coin => "coin",
            Self::Cash => "cash",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coin" => Ok(Self::Coin),
            "cash" => Ok(Self::Cash),
            other => Err(UnknownVariant {
                kind: "transaction kind",
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle state of a transaction.
///
/// `Pending` is the only non-terminal state. Only `Completed` rows count
/// towards a wallet balance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created, not yet settled.
    #[default]
    Pending,
    /// Settled successfully.
    Completed,
    /// Settled unsuccessfully; carries an error message on the row.
    Failed,
}

impl TransactionStatus {
    /// Database / wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether no further status transition is allowed.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl core::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariant {
                kind: "transaction status",
                value: other.to_owned(),
            }),
        }
    }
}

/// A persisted string did not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The offending value.
    pub value: String,
}

impl core::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}
