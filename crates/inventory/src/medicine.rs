use serde::Serialize;

use dispensary_core::{DomainError, DomainResult, MedicineId};

use crate::ledger::LedgerError;

/// A medicine catalog entry and its stock counter.
///
/// `name` is the unique, case-sensitive key the ledger is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medicine {
    id: MedicineId,
    name: String,
    quantity: i64,
    low_stock_threshold: i64,
}

impl Medicine {
    pub fn new(
        id: MedicineId,
        name: impl Into<String>,
        quantity: i64,
        low_stock_threshold: i64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("medicine name cannot be empty"));
        }
        if quantity < 0 {
            return Err(DomainError::validation(format!(
                "quantity for {name} cannot be negative"
            )));
        }
        if low_stock_threshold < 0 {
            return Err(DomainError::validation(format!(
                "low stock threshold for {name} cannot be negative"
            )));
        }
        Ok(Self {
            id,
            name,
            quantity,
            low_stock_threshold,
        })
    }

    pub fn id(&self) -> MedicineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    /// At or below the configured warning level. Informational only.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    /// Check-and-apply in one step. Leaves the counter untouched on failure.
    pub(crate) fn withdraw(&mut self, amount: i64) -> Result<i64, LedgerError> {
        self.ensure_positive(amount)?;
        if self.quantity < amount {
            return Err(LedgerError::InsufficientStock {
                name: self.name.clone(),
                available: self.quantity,
                required: amount,
            });
        }
        self.quantity -= amount;
        Ok(self.quantity)
    }

    pub(crate) fn restock(&mut self, amount: i64) -> Result<i64, LedgerError> {
        self.ensure_positive(amount)?;
        self.quantity = self
            .quantity
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                name: self.name.clone(),
                amount,
            })?;
        Ok(self.quantity)
    }

    fn ensure_positive(&self, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount {
                name: self.name.clone(),
                amount,
            });
        }
        Ok(())
    }
}
