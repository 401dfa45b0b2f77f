use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dispensary_core::{AggregateRoot, DomainError, DomainResult, HospitalId, VisitId};

use crate::order::MedicineOrder;

/// Aggregate root: Visit (dispensing view of a patient encounter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    id: VisitId,
    hospital_id: HospitalId,
    prescribed_medicines: Vec<MedicineOrder>,
    medicine_given: bool,
    given_medicines: Vec<MedicineOrder>,
    dispensed_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Visit {
    /// A visit that has not been dispensed yet.
    pub fn new(
        id: VisitId,
        hospital_id: HospitalId,
        prescribed_medicines: Vec<MedicineOrder>,
    ) -> Self {
        Self {
            id,
            hospital_id,
            prescribed_medicines,
            medicine_given: false,
            given_medicines: Vec::new(),
            dispensed_at: None,
            version: 0,
        }
    }

    pub fn prescribed_medicines(&self) -> &[MedicineOrder] {
        &self.prescribed_medicines
    }

    pub fn medicine_given(&self) -> bool {
        self.medicine_given
    }

    pub fn given_medicines(&self) -> &[MedicineOrder] {
        &self.given_medicines
    }

    pub fn dispensed_at(&self) -> Option<DateTime<Utc>> {
        self.dispensed_at
    }

    /// Flip to dispensed and record what was given, in one step.
    ///
    /// Fails with `Conflict` (and changes nothing) once the visit is dispensed.
    pub fn record_dispensed(
        &mut self,
        given_medicines: Vec<MedicineOrder>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.medicine_given {
            return Err(DomainError::conflict(format!(
                "visit {} already dispensed",
                self.id
            )));
        }
        if given_medicines.is_empty() {
            return Err(DomainError::invariant("given medicines cannot be empty"));
        }

        self.medicine_given = true;
        self.given_medicines = given_medicines;
        self.dispensed_at = Some(at);
        self.version += 1;
        Ok(())
    }

    pub fn summary(&self) -> VisitSummary {
        VisitSummary {
            visit_id: self.id,
            hospital_id: self.hospital_id,
            prescribed_medicines: self.prescribed_medicines.clone(),
            medicine_given: self.medicine_given,
            given_medicines: self.given_medicines.clone(),
        }
    }
}

impl AggregateRoot for Visit {
    type Id = VisitId;

    fn id(&self) -> VisitId {
        self.id
    }

    fn hospital_id(&self) -> HospitalId {
        self.hospital_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Read-only projection of a visit handed to callers before dispensing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitSummary {
    pub visit_id: VisitId,
    pub hospital_id: HospitalId,
    pub prescribed_medicines: Vec<MedicineOrder>,
    pub medicine_given: bool,
    pub given_medicines: Vec<MedicineOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit() -> Visit {
        Visit::new(
            VisitId::new(),
            HospitalId::new(),
            vec![MedicineOrder::new("Amla", 2)],
        )
    }

    #[test]
    fn record_dispensed_flips_flag_and_bumps_version() {
        let mut v = visit();
        let given = vec![MedicineOrder::new("Amla", 2).with_kala("morning")];

        v.record_dispensed(given.clone(), Utc::now()).unwrap();

        assert!(v.medicine_given());
        assert_eq!(v.given_medicines(), given.as_slice());
        assert!(v.dispensed_at().is_some());
        assert_eq!(v.version(), 1);
    }

    #[test]
    fn second_dispense_conflicts_without_mutation() {
        let mut v = visit();
        v.record_dispensed(vec![MedicineOrder::new("Amla", 2)], Utc::now())
            .unwrap();
        let before = v.clone();

        let err = v
            .record_dispensed(vec![MedicineOrder::new("Amla", 9)], Utc::now())
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(v, before);
    }

    #[test]
    fn empty_given_list_is_rejected() {
        let mut v = visit();
        assert!(matches!(
            v.record_dispensed(vec![], Utc::now()),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(!v.medicine_given());
        assert_eq!(v.version(), 0);
    }
}
