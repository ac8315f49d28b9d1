//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓  take the per-stream lock
//! 1. Load the stream from the store
//!   ↓
//! 2. Rehydrate the aggregate (apply history in sequence order)
//!   ↓
//! 3. Handle the command (pure decision, produces events)
//!   ↓
//! 4. Append with an exact expected version
//!   ↓
//! 5. Apply committed envelopes to the registered projections
//!   ↓
//! 6. Publish committed envelopes on the bus
//!   ↓  release the lock
//! ```
//!
//! Holding the stream lock across load, decide and append means two commands
//! against the same aggregate never race: the second one always decides on
//! top of the first one's events. Commands on different streams run in
//! parallel. Projections are updated before the lock is released, so a caller
//! reading a read model right after `dispatch` returns sees its own write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use smartstock_core::{Aggregate, AggregateId, DomainError, ExpectedVersion};
use smartstock_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
use crate::projections::{EnvelopeProjection, ProjectionError};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The aggregate refused the command.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The stream moved between load and append.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    #[error("event store failure: {0}")]
    Store(EventStoreError),

    /// Events were committed but a read model failed to absorb them.
    #[error("projection '{name}' failed: {source}")]
    Projection {
        name: &'static str,
        #[source]
        source: ProjectionError,
    },

    /// Events were committed but could not be published (at-least-once; retry may duplicate).
    #[error("event publication failed: {0}")]
    Publish(String),

    #[error("stream lock poisoned")]
    LockPoisoned,
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

/// One mutex per stream, created on first use.
#[derive(Debug, Default)]
struct StreamLocks {
    locks: Mutex<HashMap<AggregateId, Arc<Mutex<()>>>>,
}

impl StreamLocks {
    fn for_stream(&self, aggregate_id: AggregateId) -> Result<Arc<Mutex<()>>, DispatchError> {
        let mut locks = self.locks.lock().map_err(|_| DispatchError::LockPoisoned)?;
        Ok(locks.entry(aggregate_id).or_default().clone())
    }
}

/// Reusable command execution engine.
///
/// Generic over the store and the bus so tests and the server can plug in the
/// in-memory implementations while the pipeline stays the same.
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
    projections: Vec<Arc<dyn EnvelopeProjection>>,
    locks: StreamLocks,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            projections: Vec::new(),
            locks: StreamLocks::default(),
        }
    }

    /// Register a read model to be updated synchronously on every commit.
    pub fn with_projection(mut self, projection: Arc<dyn EnvelopeProjection>) -> Self {
        self.projections.push(projection);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Run `command` against the aggregate stored under `aggregate_id`.
    ///
    /// `make_aggregate` builds the empty instance that history is replayed onto.
    /// Returns the committed events, or an empty vector if the aggregate decided
    /// nothing needed to happen.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: smartstock_events::Event + Serialize + DeserializeOwned,
    {
        let lock = self.locks.for_stream(aggregate_id)?;
        let _guard = lock.lock().map_err(|_| DispatchError::LockPoisoned)?;

        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        let decided = aggregate.handle(&command)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(aggregate_id, aggregate_type.clone(), Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;
        debug!(
            aggregate_type = %aggregate_type,
            aggregate_id = %aggregate_id,
            events = committed.len(),
            "events committed"
        );

        for stored in &committed {
            let envelope = stored.to_envelope();
            for projection in &self.projections {
                projection.apply_envelope(&envelope).map_err(|source| {
                    error!(projection = projection.name(), error = %source, "projection failed after commit");
                    DispatchError::Projection {
                        name: projection.name(),
                        source,
                    }
                })?;
            }
            self.bus
                .publish(envelope)
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }

    /// Wipe every registered projection and replay the full store into it.
    pub fn rebuild_projections(&self) -> Result<usize, DispatchError> {
        let all = self.store.load_all()?;
        for projection in &self.projections {
            projection.reset();
        }
        for stored in &all {
            let envelope = stored.to_envelope();
            for projection in &self.projections {
                projection
                    .apply_envelope(&envelope)
                    .map_err(|source| DispatchError::Projection {
                        name: projection.name(),
                        source,
                    })?;
            }
        }
        Ok(all.len())
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(aggregate_id: AggregateId, stream: &[StoredEvent]) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
