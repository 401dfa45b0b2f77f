//! Compensating actions for the multi-item commit.
//!
//! The ledger has no multi-key transaction, so the commit pass applies one
//! decrement at a time and records each success here. On a later failure the
//! log is replayed in reverse as increments, which makes the whole commit
//! effectively all-or-nothing.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use dispensary_inventory::InventoryLedger;

/// A quantity removed from (or owed back to) one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub medicine_name: String,
    pub quantity: i64,
}

impl StockMovement {
    pub fn new(medicine_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            quantity,
        }
    }
}

/// Decrements applied so far by one dispense attempt, in application order.
#[derive(Debug, Default)]
pub(crate) struct CompensationLog {
    applied: Vec<StockMovement>,
}

impl CompensationLog {
    pub(crate) fn record(&mut self, movement: StockMovement) {
        self.applied.push(movement);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Undo every recorded decrement, most recent first.
    ///
    /// Each increment is tried up to `attempts` times. A movement that still
    /// fails is skipped so the remaining ones are restored anyway. Returns the
    /// number of restored movements, or the movements that could not be
    /// restored (in the order they were attempted).
    pub(crate) fn compensate<L>(self, ledger: &L, attempts: u32) -> Result<usize, Vec<StockMovement>>
    where
        L: InventoryLedger + ?Sized,
    {
        let attempts = attempts.max(1);
        let mut restored = 0;
        let mut unrestored = Vec::new();

        for movement in self.applied.into_iter().rev() {
            let mut outcome = ledger.increment(&movement.medicine_name, movement.quantity);
            let mut tries = 1;
            while let Err(err) = &outcome {
                if tries >= attempts {
                    break;
                }
                warn!(
                    medicine = %movement.medicine_name,
                    quantity = movement.quantity,
                    attempt = tries,
                    error = %err,
                    "compensating increment failed, retrying"
                );
                outcome = ledger.increment(&movement.medicine_name, movement.quantity);
                tries += 1;
            }

            match outcome {
                Ok(_) => restored += 1,
                Err(err) => {
                    error!(
                        medicine = %movement.medicine_name,
                        quantity = movement.quantity,
                        error = %err,
                        "compensating increment gave up"
                    );
                    unrestored.push(movement);
                }
            }
        }

        if unrestored.is_empty() {
            Ok(restored)
        } else {
            Err(unrestored)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use dispensary_core::MedicineId;
    use dispensary_inventory::{InMemoryInventoryLedger, LedgerError, Medicine};

    /// Records increment order and fails the first `failures` increments of `name`.
    struct RecordingLedger {
        inner: InMemoryInventoryLedger,
        name: &'static str,
        failures: Mutex<u32>,
        calls: Mutex<Vec<String>>,
    }

    impl InventoryLedger for RecordingLedger {
        fn lookup(&self, name: &str) -> Result<Medicine, LedgerError> {
            self.inner.lookup(name)
        }

        fn try_decrement(&self, name: &str, amount: i64) -> Result<i64, LedgerError> {
            self.inner.try_decrement(name, amount)
        }

        fn increment(&self, name: &str, amount: i64) -> Result<i64, LedgerError> {
            self.calls.lock().unwrap().push(name.to_string());
            if name == self.name {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(LedgerError::Unavailable("flaky".to_string()));
                }
            }
            self.inner.increment(name, amount)
        }
    }

    fn ledger(fail: &'static str, failures: u32) -> RecordingLedger {
        let inner = InMemoryInventoryLedger::new();
        for name in ["A", "B", "C"] {
            inner
                .insert(Medicine::new(MedicineId::new(), name, 10, 0).unwrap())
                .unwrap();
        }
        RecordingLedger {
            inner,
            name: fail,
            failures: Mutex::new(failures),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn log_of(ledger: &RecordingLedger, names: &[&str]) -> CompensationLog {
        let mut log = CompensationLog::default();
        for name in names {
            ledger.try_decrement(name, 4).unwrap();
            log.record(StockMovement::new(*name, 4));
        }
        log
    }

    #[test]
    fn restores_in_reverse_order() {
        let ledger = ledger("none", 0);
        let log = log_of(&ledger, &["A", "B", "C"]);

        assert_eq!(log.compensate(&ledger, 1), Ok(3));
        assert_eq!(*ledger.calls.lock().unwrap(), vec!["C", "B", "A"]);
        for name in ["A", "B", "C"] {
            assert_eq!(ledger.lookup(name).unwrap().quantity(), 10);
        }
    }

    #[test]
    fn transient_failures_are_retried() {
        let ledger = ledger("B", 2);
        let log = log_of(&ledger, &["A", "B"]);

        assert_eq!(log.compensate(&ledger, 3), Ok(2));
        assert_eq!(ledger.lookup("B").unwrap().quantity(), 10);
    }

    #[test]
    fn persistent_failure_reports_movement_and_restores_the_rest() {
        let ledger = ledger("B", u32::MAX);
        let log = log_of(&ledger, &["A", "B", "C"]);

        let unrestored = log.compensate(&ledger, 2).unwrap_err();

        assert_eq!(unrestored, vec![StockMovement::new("B", 4)]);
        assert_eq!(ledger.lookup("A").unwrap().quantity(), 10);
        assert_eq!(ledger.lookup("B").unwrap().quantity(), 6);
        assert_eq!(ledger.lookup("C").unwrap().quantity(), 10);
    }
}
