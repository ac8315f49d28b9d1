//! Append-only event store boundary.
//!
//! Streams are keyed by aggregate id. Every committed event also receives a
//! store-wide `global_position`, which gives read models a total commit order.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
