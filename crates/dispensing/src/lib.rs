//! Medicine dispensing: the all-or-nothing transaction that checks stock,
//! decrements it, and marks a visit as dispensed.
//!
//! The [`DispenseCoordinator`] is the only component with cross-entity
//! invariants. It consumes an [`InventoryLedger`](dispensary_inventory::InventoryLedger)
//! and a [`VisitDispenseState`](dispensary_visits::VisitDispenseState), and
//! publishes [`DispenseEvent`]s after committing.

pub mod compensation;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
mod locks;
pub mod request;


pub use compensation::StockMovement;
pub use config::DispenseConfig;
pub use coordinator::{
    DispenseCoordinator, DispenseOutcome, DispensePhase, DispensePreview, LowStockNotice,
    PreviewLine, StockLevel,
};
pub use error::DispenseError;
pub use events::{
    CompensationFailed, DispenseEvent, LowStockReached, VisitDispensed,
};
pub use request::{DispenseRequest, ValidatedRequest};
