use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use crate::ledger::{InventoryLedger, LedgerError};
use crate::medicine::Medicine;

type Slot = Arc<Mutex<Medicine>>;

/// In-memory inventory ledger.
///
/// Each medicine lives behind its own mutex. The outer `RwLock` only guards the
/// name -> slot map and is released before a counter is touched, so callers
/// working on different medicines never wait on each other.
#[derive(Debug, Default)]
pub struct InMemoryInventoryLedger {
    medicines: RwLock<HashMap<String, Slot>>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a medicine (keyed by its name).
    pub fn insert(&self, medicine: Medicine) -> Result<(), LedgerError> {
        let mut medicines = self
            .medicines
            .write()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;
        medicines.insert(medicine.name().to_string(), Arc::new(Mutex::new(medicine)));
        Ok(())
    }

    /// Snapshot of every medicine, ordered by name.
    pub fn snapshot(&self) -> Result<Vec<Medicine>, LedgerError> {
        let slots: Vec<Slot> = {
            let medicines = self
                .medicines
                .read()
                .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;
            medicines.values().cloned().collect()
        };

        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            let medicine = slot
                .lock()
                .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;
            out.push(medicine.clone());
        }
        out.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(out)
    }

    fn slot(&self, name: &str) -> Result<Slot, LedgerError> {
        let medicines = self
            .medicines
            .read()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;
        medicines
            .get(name)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(name.to_string()))
    }

    fn with_medicine<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Medicine) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let slot = self.slot(name)?;
        let mut medicine = slot
            .lock()
            .map_err(|_| LedgerError::Unavailable(format!("lock poisoned for {name}")))?;
        f(&mut medicine)
    }
}

impl InventoryLedger for InMemoryInventoryLedger {
    fn lookup(&self, name: &str) -> Result<Medicine, LedgerError> {
        self.with_medicine(name, |m| Ok(m.clone()))
    }

    fn try_decrement(&self, name: &str, amount: i64) -> Result<i64, LedgerError> {
        let (remaining, low_stock) =
            self.with_medicine(name, |m| Ok((m.withdraw(amount)?, m.is_low_stock())))?;
        debug!(medicine = %name, amount, remaining, low_stock, "stock decremented");
        Ok(remaining)
    }

    fn increment(&self, name: &str, amount: i64) -> Result<i64, LedgerError> {
        let quantity = self.with_medicine(name, |m| m.restock(amount))?;
        debug!(medicine = %name, amount, quantity, "stock restored");
        Ok(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispensary_core::MedicineId;
    use proptest::prelude::*;

    fn ledger_with(stock: &[(&str, i64)]) -> InMemoryInventoryLedger {
        let ledger = InMemoryInventoryLedger::new();
        for (name, quantity) in stock {
            ledger
                .insert(Medicine::new(MedicineId::new(), *name, *quantity, 0).unwrap())
                .unwrap();
        }
        ledger
    }

    #[test]
    fn decrement_returns_new_quantity() {
        let ledger = ledger_with(&[("Paracetamol", 100)]);
        assert_eq!(ledger.try_decrement("Paracetamol", 10), Ok(90));
        assert_eq!(ledger.lookup("Paracetamol").unwrap().quantity(), 90);
    }

    #[test]
    fn insufficient_stock_leaves_quantity_unchanged() {
        let ledger = ledger_with(&[("Paracetamol", 5)]);
        let err = ledger.try_decrement("Paracetamol", 10).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 5, required: 10, .. }
        ));
        assert_eq!(ledger.lookup("Paracetamol").unwrap().quantity(), 5);
    }

    #[test]
    fn names_are_case_sensitive() {
        let ledger = ledger_with(&[("Paracetamol", 5)]);
        assert_eq!(
            ledger.lookup("paracetamol").unwrap_err(),
            LedgerError::NotFound("paracetamol".to_string())
        );
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let ledger = ledger_with(&[("Ashwagandha", 5)]);
        assert!(matches!(
            ledger.try_decrement("Ashwagandha", 0),
            Err(LedgerError::InvalidAmount { amount: 0, .. })
        ));
        assert!(matches!(
            ledger.increment("Ashwagandha", -3),
            Err(LedgerError::InvalidAmount { amount: -3, .. })
        ));
        assert_eq!(ledger.lookup("Ashwagandha").unwrap().quantity(), 5);
    }

    #[test]
    fn increment_undoes_decrement() {
        let ledger = ledger_with(&[("Triphala", 40)]);
        ledger.try_decrement("Triphala", 15).unwrap();
        assert_eq!(ledger.increment("Triphala", 15), Ok(40));
    }

    #[test]
    fn snapshot_is_sorted_by_name() {
        let ledger = ledger_with(&[("Triphala", 1), ("Amla", 2), ("Guduchi", 3)]);
        let names: Vec<String> = ledger
            .snapshot()
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["Amla", "Guduchi", "Triphala"]);
    }

    #[test]
    fn concurrent_decrements_never_oversell() {
        let ledger = Arc::new(ledger_with(&[("X", 100)]));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| ledger.try_decrement("X", 1).is_ok())
                        .count()
                })
            })
            .collect();

        let succeeded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(succeeded, 100);
        assert_eq!(ledger.lookup("X").unwrap().quantity(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: applying any sequence of decrements never drives stock
        /// negative, and the final quantity is the initial quantity minus the
        /// sum of the decrements that succeeded.
        #[test]
        fn stock_never_negative_and_exactly_accounted(
            initial in 0i64..500,
            amounts in prop::collection::vec(1i64..100, 0..30)
        ) {
            let ledger = ledger_with(&[("M", initial)]);
            let mut taken = 0i64;

            for amount in amounts {
                match ledger.try_decrement("M", amount) {
                    Ok(remaining) => {
                        taken += amount;
                        prop_assert!(remaining >= 0);
                    }
                    Err(LedgerError::InsufficientStock { available, required, .. }) => {
                        prop_assert!(available < required);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                }
            }

            prop_assert_eq!(ledger.lookup("M").unwrap().quantity(), initial - taken);
        }
    }
}
