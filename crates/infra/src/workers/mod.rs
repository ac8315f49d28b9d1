//! Background subscribers on the event bus.

pub mod audit_worker;
pub mod event_worker;

pub use audit_worker::spawn_audit_log;
pub use event_worker::{EventWorker, WorkerHandle};
