//! Seed data for the in-memory adapters.

use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use dispensary_core::{HospitalId, MedicineId, VisitId};
use dispensary_dispensing::{DispenseConfig, DispenseCoordinator, DispenseEvent};
use dispensary_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use dispensary_inventory::{InMemoryInventoryLedger, Medicine};
use dispensary_visits::{InMemoryVisitStore, MedicineOrder, Visit};

pub type Envelope = EventEnvelope<DispenseEvent>;

pub type Coordinator = DispenseCoordinator<
    Arc<InMemoryInventoryLedger>,
    Arc<InMemoryVisitStore>,
    Arc<InMemoryEventBus<Envelope>>,
>;

/// A hospital's stock and open visits.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub hospital_id: HospitalId,
    #[serde(default)]
    pub medicines: Vec<MedicineSeed>,
    #[serde(default)]
    pub visits: Vec<VisitSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineSeed {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub low_stock_threshold: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitSeed {
    pub id: VisitId,
    #[serde(default)]
    pub prescribed_medicines: Vec<MedicineOrder>,
}

/// Wired coordinator plus a subscription that saw every event it published.
pub struct Dispensary {
    pub coordinator: Coordinator,
    pub events: Subscription<Envelope>,
}

impl Fixture {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("parsing fixture")
    }

    /// Seed in-memory adapters and build a coordinator over them.
    pub fn build(&self, config: DispenseConfig) -> anyhow::Result<Dispensary> {
        let ledger = Arc::new(InMemoryInventoryLedger::new());
        for seed in &self.medicines {
            let medicine = Medicine::new(
                MedicineId::new(),
                seed.name.as_str(),
                seed.quantity,
                seed.low_stock_threshold,
            )
            .with_context(|| format!("medicine {}", seed.name))?;
            ledger
                .insert(medicine)
                .with_context(|| format!("seeding medicine {}", seed.name))?;
        }

        let visits = Arc::new(InMemoryVisitStore::new());
        for seed in &self.visits {
            visits
                .insert(Visit::new(
                    seed.id,
                    self.hospital_id,
                    seed.prescribed_medicines.clone(),
                ))
                .with_context(|| format!("seeding visit {}", seed.id))?;
        }

        let bus = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe();
        tracing::debug!(
            hospital_id = %self.hospital_id,
            medicines = self.medicines.len(),
            visits = self.visits.len(),
            "fixture loaded"
        );

        Ok(Dispensary {
            coordinator: DispenseCoordinator::new(ledger, visits, bus).with_config(config),
            events,
        })
    }
}
