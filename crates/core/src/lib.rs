//! `dispensary-core`: identifiers, the domain error model and the aggregate
//! contract shared by every dispensary crate.
//!
//! Nothing here touches storage, time or IO.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::AggregateRoot;
pub use error::{DomainError, DomainResult};
pub use id::{HospitalId, MedicineId, VisitId};
