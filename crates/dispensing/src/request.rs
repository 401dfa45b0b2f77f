use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dispensary_core::{HospitalId, VisitId};
use dispensary_visits::MedicineOrder;

use crate::error::DispenseError;

/// Transient dispense input, as received from a caller.
///
/// Identifiers arrive as text and every field defaults when missing, so a
/// malformed request is rejected by [`DispenseRequest::validate`] with
/// `InvalidRequest` rather than failing somewhere in deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseRequest {
    #[serde(default)]
    pub visit_id: String,
    #[serde(default)]
    pub hospital_id: String,
    #[serde(default)]
    pub items: Vec<MedicineOrder>,
}

/// A request that passed validation: ids parsed, at least one well-formed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub visit_id: VisitId,
    pub hospital_id: HospitalId,
    pub items: Vec<MedicineOrder>,
}

impl DispenseRequest {
    pub fn new(visit_id: VisitId, hospital_id: HospitalId, items: Vec<MedicineOrder>) -> Self {
        Self {
            visit_id: visit_id.to_string(),
            hospital_id: hospital_id.to_string(),
            items,
        }
    }

    /// Reject the request wholesale if any part of it is malformed.
    pub fn validate(&self) -> Result<ValidatedRequest, DispenseError> {
        if self.visit_id.trim().is_empty() {
            return Err(DispenseError::invalid_request("visit id is required"));
        }
        if self.hospital_id.trim().is_empty() {
            return Err(DispenseError::invalid_request("hospital id is required"));
        }
        let visit_id: VisitId = self.visit_id.parse()?;
        let hospital_id: HospitalId = self.hospital_id.parse()?;

        if self.items.is_empty() {
            return Err(DispenseError::invalid_request("at least one medicine is required"));
        }
        for item in &self.items {
            item.validate()?;
        }

        Ok(ValidatedRequest {
            visit_id,
            hospital_id,
            items: self.items.clone(),
        })
    }
}

impl ValidatedRequest {
    /// Each line in request order, paired with the quantity asked for its
    /// medicine up to and including that line.
    pub fn running_totals(&self) -> Vec<(&str, i64)> {
        let mut seen: HashMap<&str, i64> = HashMap::new();
        self.items
            .iter()
            .map(|item| {
                let name = item.medicine_name.as_str();
                let total = seen.entry(name).or_default();
                *total = total.saturating_add(item.quantity);
                (name, *total)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<MedicineOrder>) -> DispenseRequest {
        DispenseRequest::new(VisitId::new(), HospitalId::new(), items)
    }

    #[test]
    fn well_formed_request_validates() {
        let req = request(vec![MedicineOrder::new("Paracetamol", 10)]);
        let valid = req.validate().unwrap();
        assert_eq!(valid.visit_id.to_string(), req.visit_id);
        assert_eq!(valid.items, req.items);
    }

    #[test]
    fn missing_or_malformed_ids_are_invalid() {
        let mut req = request(vec![MedicineOrder::new("Paracetamol", 10)]);
        req.visit_id = String::new();
        assert!(matches!(req.validate(), Err(DispenseError::InvalidRequest { .. })));

        let mut req = request(vec![MedicineOrder::new("Paracetamol", 10)]);
        req.hospital_id = "hospital-7".to_string();
        assert!(matches!(req.validate(), Err(DispenseError::InvalidRequest { .. })));
    }

    #[test]
    fn empty_items_and_bad_lines_are_invalid() {
        assert!(matches!(
            request(vec![]).validate(),
            Err(DispenseError::InvalidRequest { .. })
        ));
        assert!(matches!(
            request(vec![MedicineOrder::new("A", 1), MedicineOrder::new("", 1)]).validate(),
            Err(DispenseError::InvalidRequest { .. })
        ));
        assert!(matches!(
            request(vec![MedicineOrder::new("A", 0)]).validate(),
            Err(DispenseError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn missing_fields_deserialize_then_fail_validation() {
        let req: DispenseRequest = serde_json::from_str(r#"{"items":[{"quantity":1}]}"#).unwrap();
        assert!(matches!(req.validate(), Err(DispenseError::InvalidRequest { .. })));
    }

    #[test]
    fn running_totals_accumulate_duplicates_in_line_order() {
        let valid = request(vec![
            MedicineOrder::new("B", 2),
            MedicineOrder::new("A", 1),
            MedicineOrder::new("B", 3),
        ])
        .validate()
        .unwrap();
        assert_eq!(valid.running_totals(), vec![("B", 2), ("A", 1), ("B", 5)]);
    }
}
