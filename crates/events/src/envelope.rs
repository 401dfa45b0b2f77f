use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispensary_core::HospitalId;

use crate::Event;

/// An event plus the routing metadata consumers filter on.
///
/// `hospital_id` is the tenancy scope. `aggregate_id` is the raw uuid of
/// whatever the event describes (a visit, a medicine) and `aggregate_type`
/// says which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    schema_version: u32,
    hospital_id: HospitalId,
    aggregate_id: Uuid,
    aggregate_type: String,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a freshly emitted event under a time-ordered event id.
    pub fn wrap(
        hospital_id: HospitalId,
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: payload.event_type().to_string(),
            schema_version: payload.schema_version(),
            hospital_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            occurred_at: payload.occurred_at(),
            payload,
        }
    }

    /// Stable type name of the wrapped event.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn hospital_id(&self) -> HospitalId {
        self.hospital_id
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Restocked {
        at: DateTime<Utc>,
    }

    impl Event for Restocked {
        fn event_type(&self) -> &'static str {
            "inventory.medicine.restocked"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn wrap_copies_event_metadata() {
        let at = Utc::now();
        let hospital_id = HospitalId::new();
        let aggregate_id = Uuid::now_v7();

        let envelope =
            EventEnvelope::wrap(hospital_id, aggregate_id, "inventory.medicine", Restocked { at });

        assert_eq!(envelope.event_type(), "inventory.medicine.restocked");
        assert_eq!(envelope.schema_version(), 1);
        assert_eq!(envelope.hospital_id(), hospital_id);
        assert_eq!(envelope.aggregate_id(), aggregate_id);
        assert_eq!(envelope.aggregate_type(), "inventory.medicine");
        assert_eq!(envelope.occurred_at(), at);
        assert_eq!(envelope.into_payload(), Restocked { at });
    }

    #[test]
    fn event_ids_are_unique() {
        let a = EventEnvelope::wrap(HospitalId::new(), Uuid::now_v7(), "x", Restocked { at: Utc::now() });
        let b = EventEnvelope::wrap(HospitalId::new(), Uuid::now_v7(), "x", Restocked { at: Utc::now() });
        assert_ne!(a.event_id(), b.event_id());
    }
}
