//! Infrastructure layer: event store, dispatch pipeline, read models and
//! adapters for services outside the process.

pub mod command_dispatcher;
pub mod event_store;
pub mod external;
pub mod projections;
pub mod read_model;
pub mod snapshot;
pub mod workers;

pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use snapshot::sales_snapshot;
