//! Per-visit exclusivity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use dispensary_core::{HospitalId, VisitId};

type VisitKey = (HospitalId, VisitId);

/// One mutex per visit, created on demand and dropped when its last holder
/// leaves. Attempts for different visits never share a mutex.
///
/// The mutexes guard no data, so a poisoned lock is recovered rather than
/// propagated.
#[derive(Debug, Default)]
pub(crate) struct VisitLocks {
    slots: Mutex<HashMap<VisitKey, Arc<Mutex<()>>>>,
}

impl VisitLocks {
    /// Run `f` while holding the given visit's mutex. The slot is released
    /// even if `f` panics.
    pub(crate) fn with_exclusive<T>(&self, key: VisitKey, f: impl FnOnce() -> T) -> T {
        let lease = SlotLease {
            locks: self,
            key,
            slot: {
                let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
                slots.entry(key).or_default().clone()
            },
        };

        let _held = lease.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// One caller's claim on a slot. Dropped after the slot's mutex guard.
struct SlotLease<'a> {
    locks: &'a VisitLocks,
    key: VisitKey,
    slot: Arc<Mutex<()>>,
}

impl Drop for SlotLease<'_> {
    fn drop(&mut self) {
        // Slots are only cloned under the map lock, so a count of 2 (the map's
        // copy plus ours) means nobody else is holding or waiting.
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn slot_is_released_after_use() {
        let locks = VisitLocks::default();
        let key = (HospitalId::new(), VisitId::new());

        let value = locks.with_exclusive(key, || 42);

        assert_eq!(value, 42);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn panicking_holder_releases_its_slot() {
        let locks = VisitLocks::default();
        let key = (HospitalId::new(), VisitId::new());

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            locks.with_exclusive(key, || panic!("holder failed"))
        }));

        assert!(outcome.is_err());
        assert_eq!(locks.len(), 0);
        assert_eq!(locks.with_exclusive(key, || 7), 7);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn same_visit_is_serialised() {
        let locks = Arc::new(VisitLocks::default());
        let key = (HospitalId::new(), VisitId::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (locks, inside, max_inside) = (locks.clone(), inside.clone(), max_inside.clone());
                std::thread::spawn(move || {
                    locks.with_exclusive(key, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn different_visits_do_not_block_each_other() {
        let locks = Arc::new(VisitLocks::default());
        let hospital_id = HospitalId::new();
        let (a, b) = ((hospital_id, VisitId::new()), (hospital_id, VisitId::new()));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let locks = locks.clone();
            std::thread::spawn(move || {
                locks.with_exclusive(a, || {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };
        entered_rx.recv().unwrap();

        // Visit A is held; visit B must still go straight through.
        assert_eq!(locks.with_exclusive(b, || "b"), "b");

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(locks.len(), 0);
    }
}
