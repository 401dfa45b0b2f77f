//! Visit dispensing state.
//!
//! A visit carries its prescription and a one-way `medicine_given` flag. The
//! flag flips exactly once, atomically with recording what was given; after
//! that the visit is terminal for dispensing.

pub mod in_memory;
pub mod order;
pub mod store;
pub mod visit;

pub use in_memory::InMemoryVisitStore;
pub use order::MedicineOrder;
pub use store::{VisitDispenseState, VisitLookup, VisitStateError};
pub use visit::{Visit, VisitSummary};
