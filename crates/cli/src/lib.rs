//! Command-line front end: seed in-memory stores from a fixture, run one
//! dispense (or preview) and report the result as JSON.

pub mod fixture;

use serde::Serialize;

use dispensary_core::{HospitalId, VisitId};
use dispensary_dispensing::{
    DispenseConfig, DispenseError, DispenseOutcome, DispensePreview, DispenseRequest,
};

pub use fixture::{Dispensary, Fixture};

/// What the binary prints on stdout.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    Dispensed {
        outcome: DispenseOutcome,
        /// Event types published during the run, in order.
        events: Vec<&'static str>,
    },
    Failed {
        error: DispenseError,
        events: Vec<&'static str>,
    },
    Preview {
        preview: DispensePreview,
    },
}

impl Report {
    pub fn is_success(&self) -> bool {
        !matches!(self, Report::Failed { .. })
    }
}

/// Decode a request document. Malformed JSON is an invalid request, not an
/// operational failure.
pub fn parse_request(text: &str) -> Result<DispenseRequest, DispenseError> {
    serde_json::from_str(text)
        .map_err(|err| DispenseError::invalid_request(format!("malformed request: {err}")))
}

/// Dispense `request_json` against a dispensary seeded from `fixture`.
pub fn dispense(
    fixture: &Fixture,
    request_json: &str,
    config: DispenseConfig,
) -> anyhow::Result<Report> {
    let dispensary = fixture.build(config)?;

    let result = parse_request(request_json)
        .and_then(|request| dispensary.coordinator.dispense(&request));
    let events = dispensary
        .events
        .drain()
        .iter()
        .map(|envelope| envelope.event_type())
        .collect();

    Ok(match result {
        Ok(outcome) => Report::Dispensed { outcome, events },
        Err(error) => Report::Failed { error, events },
    })
}

/// Preview the visit named by `request_json` without changing anything.
pub fn preview(
    fixture: &Fixture,
    request_json: &str,
    config: DispenseConfig,
) -> anyhow::Result<Report> {
    let dispensary = fixture.build(config)?;

    let result = parse_request(request_json).and_then(|request| {
        let hospital_id: HospitalId = request.hospital_id.parse()?;
        let visit_id: VisitId = request.visit_id.parse()?;
        dispensary.coordinator.preview(hospital_id, visit_id)
    });

    Ok(match result {
        Ok(preview) => Report::Preview { preview },
        Err(error) => Report::Failed {
            error,
            events: Vec::new(),
        },
    })
}
