use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dispensary_core::{HospitalId, MedicineId, VisitId};
use dispensary_events::Event;
use dispensary_visits::MedicineOrder;

use crate::compensation::StockMovement;

/// Aggregate type for events describing a visit.
pub const VISIT_AGGREGATE_TYPE: &str = "dispensing.visit";

/// Aggregate type for events describing a medicine's stock.
pub const MEDICINE_AGGREGATE_TYPE: &str = "inventory.medicine";

/// Event: VisitDispensed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDispensed {
    pub hospital_id: HospitalId,
    pub visit_id: VisitId,
    pub given_medicines: Vec<MedicineOrder>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LowStockReached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockReached {
    pub hospital_id: HospitalId,
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i64,
    pub threshold: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CompensationFailed (inventory needs manual reconciliation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationFailed {
    pub hospital_id: HospitalId,
    pub visit_id: VisitId,
    pub cause: String,
    pub unrestored: Vec<StockMovement>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispenseEvent {
    VisitDispensed(VisitDispensed),
    LowStockReached(LowStockReached),
    CompensationFailed(CompensationFailed),
}

impl Event for DispenseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DispenseEvent::VisitDispensed(_) => "dispensing.visit.dispensed",
            DispenseEvent::LowStockReached(_) => "inventory.medicine.low_stock",
            DispenseEvent::CompensationFailed(_) => "dispensing.compensation.failed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DispenseEvent::VisitDispensed(e) => e.occurred_at,
            DispenseEvent::LowStockReached(e) => e.occurred_at,
            DispenseEvent::CompensationFailed(e) => e.occurred_at,
        }
    }
}
