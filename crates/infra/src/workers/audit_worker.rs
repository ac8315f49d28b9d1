//! Structured audit trail of every committed event.

use std::io;

use serde_json::Value as JsonValue;
use tracing::info;

use smartstock_events::{EventBus, EventEnvelope};

use super::event_worker::{EventWorker, WorkerHandle};

/// Log each published envelope at `info` under the `audit` target.
pub fn spawn_audit_log<B>(bus: &B) -> io::Result<WorkerHandle>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    EventWorker::spawn("audit-log", bus, |env: EventEnvelope<JsonValue>| -> Result<(), io::Error> {
        info!(
            target: "audit",
            event_id = %env.event_id(),
            aggregate_type = env.aggregate_type(),
            aggregate_id = %env.aggregate_id(),
            sequence = env.sequence_number(),
            position = env.global_position(),
            event_type = env.event_type(),
            occurred_at = %env.occurred_at(),
            "event committed"
        );
        Ok(())
    })
}
