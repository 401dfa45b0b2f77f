//! Hospital-scoped aggregates.

use core::fmt::{Debug, Display};
use core::hash::Hash;

use crate::id::HospitalId;

/// A record owned by exactly one hospital that changes only through
/// versioned transitions.
///
/// Stores index aggregates by [`scope_key`](AggregateRoot::scope_key), so the
/// same id under another hospital is a different (usually missing) record.
pub trait AggregateRoot {
    type Id: Copy + Eq + Hash + Debug + Display;

    fn id(&self) -> Self::Id;

    fn hospital_id(&self) -> HospitalId;

    /// Transitions applied since creation; starts at 0.
    fn version(&self) -> u64;

    fn scope_key(&self) -> (HospitalId, Self::Id) {
        (self.hospital_id(), self.id())
    }
}
