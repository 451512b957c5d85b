//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every economy record has a strongly-typed ID so a wallet id can never be
//! passed where a player id is expected. New ids use UUID v7 (time-ordered)
//! for index locality; ids read back from the store keep whatever version
//! they were written with.
//!
//! The nil UUID is the "empty identifier". Stores reject it wherever a
//! reference is required.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The empty identifier (nil UUID).
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this is the empty identifier.
            pub const fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player (the `users` table).
    PlayerId
}

define_id! {
    /// Unique identifier for a player's wallet.
    WalletId
}

define_id! {
    /// Unique identifier for a ledger transaction.
    TransactionId
}

define_id! {
    /// Unique identifier for a collected creature.
    CreatureId
}
