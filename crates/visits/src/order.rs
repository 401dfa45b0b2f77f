use serde::{Deserialize, Serialize};

use dispensary_core::{DomainError, DomainResult};

/// One prescription line: a medicine, how much of it, and how to take it.
///
/// `dosage`, `instructions`, `kala` (time of administration) and `anupana`
/// (vehicle taken with the medicine) are free text and are carried through
/// unchanged. Missing fields deserialize as empty so that malformed input
/// reaches validation instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineOrder {
    #[serde(default)]
    pub medicine_name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub kala: String,
    #[serde(default)]
    pub anupana: String,
}

impl MedicineOrder {
    pub fn new(medicine_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            quantity,
            dosage: String::new(),
            instructions: String::new(),
            kala: String::new(),
            anupana: String::new(),
        }
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = dosage.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_kala(mut self, kala: impl Into<String>) -> Self {
        self.kala = kala.into();
        self
    }

    pub fn with_anupana(mut self, anupana: impl Into<String>) -> Self {
        self.anupana = anupana.into();
        self
    }

    /// A line is dispensable when it names a medicine and asks for at least one unit.
    pub fn validate(&self) -> DomainResult<()> {
        if self.medicine_name.trim().is_empty() {
            return Err(DomainError::validation("medicine name cannot be empty"));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for {} must be positive (got {})",
                self.medicine_name, self.quantity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_annotations_deserialize_as_empty() {
        let order: MedicineOrder =
            serde_json::from_str(r#"{"medicine_name":"Triphala","quantity":2}"#).unwrap();
        assert_eq!(order, MedicineOrder::new("Triphala", 2));
    }

    #[test]
    fn annotations_are_preserved() {
        let order = MedicineOrder::new("Triphala", 2)
            .with_dosage("1 tsp")
            .with_instructions("after food")
            .with_kala("night")
            .with_anupana("warm water");
        let json = serde_json::to_string(&order).unwrap();
        let back: MedicineOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kala, "night");
        assert_eq!(back.anupana, "warm water");
        assert_eq!(back, order);
    }

    #[test]
    fn blank_name_and_non_positive_quantity_are_invalid() {
        assert!(MedicineOrder::new(" ", 1).validate().is_err());
        assert!(MedicineOrder::new("Amla", 0).validate().is_err());
        assert!(MedicineOrder::new("Amla", -4).validate().is_err());
        assert!(MedicineOrder::new("Amla", 1).validate().is_ok());
    }
}
