//! Inventory ledger: per-medicine stock counters.
//!
//! The ledger is the sole writer of a medicine's `quantity`. Its only mutating
//! operations are the atomic conditional decrement and the compensating
//! increment; catalog management lives elsewhere.

pub mod in_memory;
pub mod ledger;
pub mod medicine;

pub use in_memory::InMemoryInventoryLedger;
pub use ledger::{InventoryLedger, LedgerError};
pub use medicine::Medicine;
