//! Dispense orchestration.
//!
//! `DispenseCoordinator` turns a [`DispenseRequest`] into one all-or-nothing
//! change across the inventory ledger and the visit store:
//!
//! ```text
//! DispenseRequest
//!   ↓
//! 1. Validate request shape (no side effects)
//!   ↓  per-visit mutex held from here on
//! 2. Re-check the dispensed flag
//!   ↓
//! 3. Validation pass: look up every medicine (fail fast, no mutation)
//!   ↓
//! 4. Commit pass: atomic decrement per item, compensate in reverse on failure
//!   ↓
//! 5. Compare-and-set the visit to dispensed (compensate everything on loss)
//!   ↓
//! 6. Publish events, return the outcome
//! ```
//!
//! The validation pass only exists to report precise errors before touching
//! data. Correctness rests on the ledger's atomic decrement and the visit
//! store's compare-and-set, so the outcome is right whatever step 3 observed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use dispensary_core::{AggregateRoot, HospitalId, MedicineId, VisitId};
use dispensary_events::{EventBus, EventEnvelope};
use dispensary_inventory::{InventoryLedger, LedgerError, Medicine};
use dispensary_visits::{MedicineOrder, VisitDispenseState, VisitLookup, VisitSummary};

use crate::compensation::{CompensationLog, StockMovement};
use crate::config::DispenseConfig;
use crate::error::DispenseError;
use crate::events::{
    CompensationFailed, DispenseEvent, LowStockReached, MEDICINE_AGGREGATE_TYPE,
    VISIT_AGGREGATE_TYPE, VisitDispensed,
};
use crate::locks::VisitLocks;
use crate::request::{DispenseRequest, ValidatedRequest};

/// States a single dispense attempt moves through.
///
/// `Pending → Validating → Committing → Dispensed` on success,
/// `Pending → Validating → Rejected` when nothing was touched, and
/// `Committing → RolledBack → Rejected` when decrements had to be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispensePhase {
    Pending,
    Validating,
    Committing,
    RolledBack,
    Dispensed,
    Rejected,
}

/// Stock left for one medicine right after this attempt's decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub medicine_name: String,
    pub quantity: i64,
}

/// A dispensed medicine that ended at or below its low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockNotice {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i64,
    pub threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispenseOutcome {
    pub visit_id: VisitId,
    pub hospital_id: HospitalId,
    /// The list stored on the visit.
    pub given_medicines: Vec<MedicineOrder>,
    /// One entry per dispensed medicine, in request order.
    pub remaining: Vec<StockLevel>,
    pub low_stock: Vec<LowStockNotice>,
    pub dispensed_at: DateTime<Utc>,
}

/// One prescribed line checked against current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub order: MedicineOrder,
    /// `None` when the medicine is not in the ledger.
    pub available: Option<i64>,
    pub sufficient: bool,
}

/// Read-only view of whether a visit's prescription could be dispensed now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispensePreview {
    pub visit: VisitSummary,
    pub lines: Vec<PreviewLine>,
    pub dispensable: bool,
}

/// Orchestrates validation, the compensated multi-item commit and the visit
/// transition.
///
/// - `L`: inventory ledger (sole writer of stock quantities)
/// - `V`: visit store (sole owner of the dispensed flag)
/// - `B`: event bus for facts published after a commit
pub struct DispenseCoordinator<L, V, B> {
    ledger: L,
    visits: V,
    bus: B,
    config: DispenseConfig,
    locks: VisitLocks,
}

/// Decrements applied by the commit pass, held until the visit flips.
struct Commit {
    log: CompensationLog,
    remaining: HashMap<String, i64>,
}

impl<L, V, B> DispenseCoordinator<L, V, B> {
    pub fn new(ledger: L, visits: V, bus: B) -> Self {
        Self {
            ledger,
            visits,
            bus,
            config: DispenseConfig::default(),
            locks: VisitLocks::default(),
        }
    }

    pub fn with_config(mut self, config: DispenseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> DispenseConfig {
        self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn visits(&self) -> &V {
        &self.visits
    }
}

impl<L, V, B> DispenseCoordinator<L, V, B>
where
    L: InventoryLedger,
    V: VisitDispenseState,
    B: EventBus<EventEnvelope<DispenseEvent>>,
{
    /// Dispense every item of `request` against the visit, or nothing at all.
    pub fn dispense(&self, request: &DispenseRequest) -> Result<DispenseOutcome, DispenseError> {
        let request = request.validate().inspect_err(|err| {
            info!(error = %err, phase = ?DispensePhase::Rejected, "dispense request rejected");
        })?;

        let span = info_span!(
            "dispense",
            hospital_id = %request.hospital_id,
            visit_id = %request.visit_id,
            items = request.items.len()
        );
        let _entered = span.enter();
        debug!(phase = ?DispensePhase::Pending, "dispense attempt started");

        let result = self
            .locks
            .with_exclusive((request.hospital_id, request.visit_id), || {
                self.dispense_exclusive(&request)
            });

        match &result {
            Ok(outcome) => info!(
                phase = ?DispensePhase::Dispensed,
                low_stock = outcome.low_stock.len(),
                "visit dispensed"
            ),
            Err(err) if err.is_fatal() => {
                error!(error = %err, "dispense left inventory inconsistent");
            }
            Err(err) => info!(error = %err, phase = ?DispensePhase::Rejected, "dispense rejected"),
        }

        result
    }

    fn dispense_exclusive(
        &self,
        request: &ValidatedRequest,
    ) -> Result<DispenseOutcome, DispenseError> {
        if self
            .visits
            .is_dispensed(request.hospital_id, request.visit_id)?
        {
            return Err(DispenseError::AlreadyDispensed {
                visit_id: request.visit_id,
            });
        }

        debug!(phase = ?DispensePhase::Validating, "checking stock");
        let catalog = self.validate_stock(request)?;

        debug!(phase = ?DispensePhase::Committing, "applying decrements");
        let commit = self.commit(request)?;

        let visit = match self.visits.mark_dispensed(
            request.hospital_id,
            request.visit_id,
            request.items.clone(),
        ) {
            Ok(visit) => visit,
            Err(err) => return Err(self.roll_back(request, commit.log, err.into())),
        };

        let remaining = remaining_levels(request, &commit.remaining);
        let low_stock = low_stock_notices(&remaining, &catalog);
        let outcome = DispenseOutcome {
            visit_id: visit.id(),
            hospital_id: visit.hospital_id(),
            given_medicines: visit.given_medicines().to_vec(),
            remaining,
            low_stock,
            dispensed_at: visit.dispensed_at().unwrap_or_else(Utc::now),
        };

        self.publish_dispensed(&outcome);
        Ok(outcome)
    }

    /// Fail-fast check line by line; the first failing line decides the error.
    /// A repeated medicine is checked against its running total.
    fn validate_stock(
        &self,
        request: &ValidatedRequest,
    ) -> Result<HashMap<String, Medicine>, DispenseError> {
        let mut catalog: HashMap<String, Medicine> = HashMap::new();
        for (name, required) in request.running_totals() {
            let available = match catalog.get(name) {
                Some(medicine) => medicine.quantity(),
                None => {
                    let medicine = self.ledger.lookup(name)?;
                    let available = medicine.quantity();
                    catalog.insert(name.to_string(), medicine);
                    available
                }
            };
            if available < required {
                return Err(DispenseError::InsufficientStock {
                    name: name.to_string(),
                    available,
                    required,
                });
            }
        }
        Ok(catalog)
    }

    fn commit(&self, request: &ValidatedRequest) -> Result<Commit, DispenseError> {
        let mut log = CompensationLog::default();
        let mut remaining = HashMap::new();

        for item in &request.items {
            match self.ledger.try_decrement(&item.medicine_name, item.quantity) {
                Ok(quantity) => {
                    log.record(StockMovement::new(&item.medicine_name, item.quantity));
                    remaining.insert(item.medicine_name.clone(), quantity);
                }
                Err(err) => {
                    debug!(medicine = %item.medicine_name, error = %err, "decrement refused");
                    return Err(self.roll_back(request, log, err.into()));
                }
            }
        }

        Ok(Commit { log, remaining })
    }

    /// Undo `log` and return the error the caller should see: `cause` when
    /// every movement was restored, `CompensationFailed` otherwise.
    fn roll_back(
        &self,
        request: &ValidatedRequest,
        log: CompensationLog,
        cause: DispenseError,
    ) -> DispenseError {
        if log.is_empty() {
            return cause;
        }

        match log.compensate(&self.ledger, self.config.compensation_attempts) {
            Ok(restored) => {
                warn!(
                    phase = ?DispensePhase::RolledBack,
                    restored,
                    error = %cause,
                    "dispense rolled back"
                );
                cause
            }
            Err(unrestored) => {
                let cause = cause.to_string();
                self.publish(
                    request.hospital_id,
                    *request.visit_id.as_uuid(),
                    VISIT_AGGREGATE_TYPE,
                    DispenseEvent::CompensationFailed(CompensationFailed {
                        hospital_id: request.hospital_id,
                        visit_id: request.visit_id,
                        cause: cause.clone(),
                        unrestored: unrestored.clone(),
                        occurred_at: Utc::now(),
                    }),
                );
                DispenseError::CompensationFailed { cause, unrestored }
            }
        }
    }

    fn publish_dispensed(&self, outcome: &DispenseOutcome) {
        self.publish(
            outcome.hospital_id,
            *outcome.visit_id.as_uuid(),
            VISIT_AGGREGATE_TYPE,
            DispenseEvent::VisitDispensed(VisitDispensed {
                hospital_id: outcome.hospital_id,
                visit_id: outcome.visit_id,
                given_medicines: outcome.given_medicines.clone(),
                occurred_at: outcome.dispensed_at,
            }),
        );

        if !self.config.publish_low_stock {
            return;
        }
        for notice in &outcome.low_stock {
            warn!(
                medicine = %notice.medicine_name,
                quantity = notice.quantity,
                threshold = notice.threshold,
                "medicine at or below low-stock threshold"
            );
            self.publish(
                outcome.hospital_id,
                *notice.medicine_id.as_uuid(),
                MEDICINE_AGGREGATE_TYPE,
                DispenseEvent::LowStockReached(LowStockReached {
                    hospital_id: outcome.hospital_id,
                    medicine_id: notice.medicine_id,
                    medicine_name: notice.medicine_name.clone(),
                    quantity: notice.quantity,
                    threshold: notice.threshold,
                    occurred_at: outcome.dispensed_at,
                }),
            );
        }
    }

    /// Best-effort: the state change is already committed, so a failed
    /// publication is logged and does not alter the result.
    fn publish(
        &self,
        hospital_id: HospitalId,
        aggregate_id: Uuid,
        aggregate_type: &str,
        event: DispenseEvent,
    ) {
        let envelope = EventEnvelope::wrap(hospital_id, aggregate_id, aggregate_type, event);
        let event_type = envelope.event_type();
        if let Err(err) = self.bus.publish(envelope) {
            warn!(event_type, error = ?err, "event publication failed");
        }
    }
}

impl<L, V, B> DispenseCoordinator<L, V, B>
where
    L: InventoryLedger,
    V: VisitLookup,
{
    /// Check a visit's prescription against current stock without mutating
    /// anything.
    pub fn preview(
        &self,
        hospital_id: HospitalId,
        visit_id: VisitId,
    ) -> Result<DispensePreview, DispenseError> {
        let visit = self.visits.find_visit(hospital_id, visit_id)?;

        let lines = visit
            .prescribed_medicines
            .iter()
            .map(|order| {
                let available = match self.ledger.lookup(&order.medicine_name) {
                    Ok(medicine) => Some(medicine.quantity()),
                    Err(LedgerError::NotFound(_)) => None,
                    Err(err) => return Err(DispenseError::from(err)),
                };
                Ok(PreviewLine {
                    order: order.clone(),
                    available,
                    sufficient: available.is_some_and(|a| a >= order.quantity),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let dispensable =
            !visit.medicine_given && !lines.is_empty() && lines.iter().all(|l| l.sufficient);

        Ok(DispensePreview {
            visit,
            lines,
            dispensable,
        })
    }
}

fn remaining_levels(request: &ValidatedRequest, finals: &HashMap<String, i64>) -> Vec<StockLevel> {
    let mut levels: Vec<StockLevel> = Vec::new();
    for item in &request.items {
        if levels.iter().any(|l| l.medicine_name == item.medicine_name) {
            continue;
        }
        if let Some(quantity) = finals.get(&item.medicine_name) {
            levels.push(StockLevel {
                medicine_name: item.medicine_name.clone(),
                quantity: *quantity,
            });
        }
    }
    levels
}

fn low_stock_notices(
    remaining: &[StockLevel],
    catalog: &HashMap<String, Medicine>,
) -> Vec<LowStockNotice> {
    remaining
        .iter()
        .filter_map(|level| {
            let medicine = catalog.get(&level.medicine_name)?;
            (level.quantity <= medicine.low_stock_threshold()).then(|| LowStockNotice {
                medicine_id: medicine.id(),
                medicine_name: level.medicine_name.clone(),
                quantity: level.quantity,
                threshold: medicine.low_stock_threshold(),
            })
        })
        .collect()
}
