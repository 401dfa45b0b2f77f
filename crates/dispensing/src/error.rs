use serde::Serialize;
use thiserror::Error;

use dispensary_core::{DomainError, VisitId};
use dispensary_inventory::LedgerError;
use dispensary_visits::VisitStateError;

use crate::compensation::StockMovement;

/// Why a dispense attempt failed.
///
/// Every variant except `CompensationFailed` guarantees that nothing was
/// mutated (or that every mutation was undone). `CompensationFailed` means
/// inventory may be inconsistent and needs manual reconciliation.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispenseError {
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("visit not found: {visit_id}")]
    VisitNotFound { visit_id: VisitId },

    #[error("visit already dispensed: {visit_id}")]
    AlreadyDispensed { visit_id: VisitId },

    #[error("medicine not found: {name}")]
    MedicineNotFound { name: String },

    #[error("insufficient stock for {name}: available {available}, required {required}")]
    InsufficientStock {
        name: String,
        available: i64,
        required: i64,
    },

    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("compensation failed after '{cause}'; {} movement(s) not restored", .unrestored.len())]
    CompensationFailed {
        cause: String,
        unrestored: Vec<StockMovement>,
    },
}

impl DispenseError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Inventory may be inconsistent; an operator has to intervene.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CompensationFailed { .. })
    }
}

impl From<LedgerError> for DispenseError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotFound(name) => Self::MedicineNotFound { name },
            LedgerError::InsufficientStock {
                name,
                available,
                required,
            } => Self::InsufficientStock {
                name,
                available,
                required,
            },
            err @ LedgerError::InvalidAmount { .. } => Self::invalid_request(err.to_string()),
            LedgerError::Unavailable(reason) => Self::StoreUnavailable { reason },
        }
    }
}

impl From<VisitStateError> for DispenseError {
    fn from(value: VisitStateError) -> Self {
        match value {
            VisitStateError::NotFound(visit_id) => Self::VisitNotFound { visit_id },
            VisitStateError::AlreadyDispensed(visit_id) => Self::AlreadyDispensed { visit_id },
            VisitStateError::Rejected(err) => Self::invalid_request(err.to_string()),
            VisitStateError::Unavailable(reason) => Self::StoreUnavailable { reason },
        }
    }
}

impl From<DomainError> for DispenseError {
    fn from(value: DomainError) -> Self {
        Self::invalid_request(value.to_string())
    }
}
