//! Domain events and their transport.
//!
//! Events are facts emitted after a state change has been committed. They are
//! wrapped in an [`EventEnvelope`] carrying the hospital (tenant) scope and the
//! identity of the aggregate they describe, then handed to an [`EventBus`].

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
