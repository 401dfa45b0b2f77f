use std::sync::Arc;

use thiserror::Error;

use dispensary_core::{DomainError, HospitalId, VisitId};

use crate::order::MedicineOrder;
use crate::visit::{Visit, VisitSummary};

/// Visit store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisitStateError {
    #[error("visit not found: {0}")]
    NotFound(VisitId),

    #[error("visit already dispensed: {0}")]
    AlreadyDispensed(VisitId),

    #[error("visit rejected: {0}")]
    Rejected(DomainError),

    #[error("visit store unavailable: {0}")]
    Unavailable(String),
}

/// Owner of a visit's one-way dispensed flag.
///
/// Every operation is scoped to a hospital; a visit of another hospital is
/// reported as `NotFound`.
pub trait VisitDispenseState: Send + Sync {
    /// Snapshot of the dispensed flag.
    fn is_dispensed(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<bool, VisitStateError>;

    /// Compare-and-set: succeeds only while the visit is not dispensed, and
    /// flips the flag together with storing `given_medicines`.
    ///
    /// Under concurrent calls for one visit at most one caller gets `Ok`; the
    /// rest get `AlreadyDispensed` and nothing is mutated for them.
    fn mark_dispensed(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
        given_medicines: Vec<MedicineOrder>,
    ) -> Result<Visit, VisitStateError>;
}

/// Visit/token resolution collaborator.
pub trait VisitLookup: Send + Sync {
    fn find_visit(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<VisitSummary, VisitStateError>;
}

impl<S> VisitDispenseState for Arc<S>
where
    S: VisitDispenseState + ?Sized,
{
    fn is_dispensed(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<bool, VisitStateError> {
        (**self).is_dispensed(hospital_id, visit_id)
    }

    fn mark_dispensed(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
        given_medicines: Vec<MedicineOrder>,
    ) -> Result<Visit, VisitStateError> {
        (**self).mark_dispensed(hospital_id, visit_id, given_medicines)
    }
}

impl<S> VisitLookup for Arc<S>
where
    S: VisitLookup + ?Sized,
{
    fn find_visit(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<VisitSummary, VisitStateError> {
        (**self).find_visit(hospital_id, visit_id)
    }
}
