use std::sync::Arc;

use thiserror::Error;

use crate::medicine::Medicine;

/// Inventory ledger operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("medicine not found: {0}")]
    NotFound(String),

    #[error("insufficient stock for {name}: available {available}, required {required}")]
    InsufficientStock {
        name: String,
        available: i64,
        required: i64,
    },

    #[error("invalid amount {amount} for {name}")]
    InvalidAmount { name: String, amount: i64 },

    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// Per-medicine stock counters with an atomic conditional decrement.
///
/// Implementations must:
/// - apply `try_decrement` as one indivisible check-and-write per medicine
/// - never leave a quantity negative, never partially apply a decrement
/// - serialise calls per medicine only (no table-wide lock while mutating)
/// - accept `increment` under concurrent activity on the same medicine
pub trait InventoryLedger: Send + Sync {
    /// Read-only snapshot of one medicine.
    fn lookup(&self, name: &str) -> Result<Medicine, LedgerError>;

    /// Atomically remove `amount` units if at least that many are in stock.
    ///
    /// Returns the new quantity.
    fn try_decrement(&self, name: &str, amount: i64) -> Result<i64, LedgerError>;

    /// Return `amount` units to stock (compensates a prior decrement).
    ///
    /// Returns the new quantity.
    fn increment(&self, name: &str, amount: i64) -> Result<i64, LedgerError>;
}

impl<L> InventoryLedger for Arc<L>
where
    L: InventoryLedger + ?Sized,
{
    fn lookup(&self, name: &str) -> Result<Medicine, LedgerError> {
        (**self).lookup(name)
    }

    fn try_decrement(&self, name: &str, amount: i64) -> Result<i64, LedgerError> {
        (**self).try_decrement(name, amount)
    }

    fn increment(&self, name: &str, amount: i64) -> Result<i64, LedgerError> {
        (**self).increment(name, amount)
    }
}
