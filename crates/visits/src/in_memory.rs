use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tracing::debug;

use dispensary_core::{AggregateRoot, HospitalId, VisitId};

use crate::order::MedicineOrder;
use crate::store::{VisitDispenseState, VisitLookup, VisitStateError};
use crate::visit::{Visit, VisitSummary};

type Slot = Arc<Mutex<Visit>>;

/// In-memory, hospital-isolated visit store for tests/dev.
///
/// Visits are keyed by `(hospital_id, visit_id)`, each behind its own mutex, so
/// the dispensed compare-and-set on one visit never waits on another visit.
#[derive(Debug, Default)]
pub struct InMemoryVisitStore {
    visits: RwLock<HashMap<(HospitalId, VisitId), Slot>>,
}

impl InMemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a visit.
    pub fn insert(&self, visit: Visit) -> Result<(), VisitStateError> {
        let mut visits = self
            .visits
            .write()
            .map_err(|_| VisitStateError::Unavailable("lock poisoned".to_string()))?;
        visits.insert(visit.scope_key(), Arc::new(Mutex::new(visit)));
        Ok(())
    }

    /// Full snapshot of one visit.
    pub fn get(&self, hospital_id: HospitalId, visit_id: VisitId) -> Result<Visit, VisitStateError> {
        self.with_visit(hospital_id, visit_id, |v| Ok(v.clone()))
    }

    fn slot(&self, hospital_id: HospitalId, visit_id: VisitId) -> Result<Slot, VisitStateError> {
        let visits = self
            .visits
            .read()
            .map_err(|_| VisitStateError::Unavailable("lock poisoned".to_string()))?;
        visits
            .get(&(hospital_id, visit_id))
            .cloned()
            .ok_or(VisitStateError::NotFound(visit_id))
    }

    fn with_visit<T>(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
        f: impl FnOnce(&mut Visit) -> Result<T, VisitStateError>,
    ) -> Result<T, VisitStateError> {
        let slot = self.slot(hospital_id, visit_id)?;
        let mut visit = slot
            .lock()
            .map_err(|_| VisitStateError::Unavailable(format!("lock poisoned for visit {visit_id}")))?;
        f(&mut visit)
    }
}

impl VisitDispenseState for InMemoryVisitStore {
    fn is_dispensed(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<bool, VisitStateError> {
        self.with_visit(hospital_id, visit_id, |v| Ok(v.medicine_given()))
    }

    fn mark_dispensed(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
        given_medicines: Vec<MedicineOrder>,
    ) -> Result<Visit, VisitStateError> {
        self.with_visit(hospital_id, visit_id, |v| {
            v.record_dispensed(given_medicines, Utc::now())
                .map_err(|e| {
                    if e.is_conflict() {
                        VisitStateError::AlreadyDispensed(visit_id)
                    } else {
                        VisitStateError::Rejected(e)
                    }
                })?;
            debug!(%visit_id, version = v.version(), "visit marked dispensed");
            Ok(v.clone())
        })
    }
}

impl VisitLookup for InMemoryVisitStore {
    fn find_visit(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<VisitSummary, VisitStateError> {
        self.with_visit(hospital_id, visit_id, |v| Ok(v.summary()))
    }
}
