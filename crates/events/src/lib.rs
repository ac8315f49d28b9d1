//! Event contracts shared by the domain crates and the infrastructure layer.
//!
//! - [`Event`]: metadata every domain event exposes (type name, schema version, time).
//! - [`EventEnvelope`]: a committed event plus its stream position.
//! - [`EventBus`]: fan-out of committed envelopes to subscribers.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
