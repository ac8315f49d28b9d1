//! Read models built from committed envelopes.
//!
//! Every projection here is:
//! - rebuildable from the event store (`reset` then replay)
//! - idempotent: an envelope at or below the stream cursor is ignored
//! - strict: a gap in a stream's sequence numbers is an error

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use smartstock_core::AggregateId;
use smartstock_events::EventEnvelope;

use crate::read_model::ReadModelError;

pub mod accounts;
pub mod ledger;
pub mod personnel_requests;
pub mod products;
pub mod purchase_orders;

pub use accounts::{AccountReadModel, AccountsProjection};
pub use ledger::{LedgerEntry, LedgerProjection};
pub use personnel_requests::{PersonnelRequestReadModel, PersonnelRequestsProjection};
pub use products::{ProductReadModel, ProductsProjection};
pub use purchase_orders::{PurchaseOrderReadModel, PurchaseOrdersProjection};

/// Aggregate type tags used on streams.
pub mod aggregate_types {
    pub const ACCOUNT: &str = "auth.account";
    pub const PERSONNEL_REQUEST: &str = "personnel.request";
    pub const PRODUCT: &str = "inventory.product";
    pub const PURCHASE_ORDER: &str = "purchasing.purchase_order";
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("event does not belong to its stream: {0}")]
    StreamMismatch(String),

    #[error("read model unavailable: {0}")]
    Unavailable(String),
}

impl From<ReadModelError> for ProjectionError {
    fn from(err: ReadModelError) -> Self {
        match err {
            ReadModelError::Unavailable(msg) => ProjectionError::Unavailable(msg),
        }
    }
}

/// A read model fed by the command dispatcher.
pub trait EnvelopeProjection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Absorb one committed envelope. Envelopes for other aggregate types are ignored.
    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError>;

    /// Forget everything, ahead of a replay.
    fn reset(&self);
}

/// Per-stream cursors giving at-least-once delivery exactly-once effect.
#[derive(Debug, Default)]
pub struct StreamCursors {
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `apply` if `envelope` is the next event of its stream, then advance the cursor.
    ///
    /// Replays at or below the cursor are skipped silently. The cursor lock is
    /// held for the duration of `apply`, serializing writers of this projection.
    pub fn advance<F>(&self, envelope: &EventEnvelope<JsonValue>, apply: F) -> Result<(), ProjectionError>
    where
        F: FnOnce() -> Result<(), ProjectionError>,
    {
        let mut cursors = self
            .cursors
            .write()
            .map_err(|_| ProjectionError::Unavailable("cursor lock poisoned".to_string()))?;

        let key = envelope.aggregate_id();
        let seq = envelope.sequence_number();
        let last = cursors.get(&key).copied().unwrap_or(0);

        if seq == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }

        apply()?;
        cursors.insert(key, seq);
        Ok(())
    }

    pub fn clear(&self) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }
    }
}

pub(crate) fn decode<E: serde::de::DeserializeOwned>(
    envelope: &EventEnvelope<JsonValue>,
) -> Result<E, ProjectionError> {
    serde_json::from_value(envelope.payload().clone()).map_err(|e| ProjectionError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn envelope(aggregate_id: AggregateId, seq: u64) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            aggregate_id,
            aggregate_types::PRODUCT.to_string(),
            seq,
            seq,
            "inventory.stock_changed".to_string(),
            Utc::now(),
            json!({}),
        )
    }

    #[test]
    fn cursors_skip_replays_and_reject_gaps() {
        let cursors = StreamCursors::new();
        let id = AggregateId::new();
        let mut applied = 0;

        cursors.advance(&envelope(id, 1), || {
            applied += 1;
            Ok(())
        })
        .unwrap();
        cursors.advance(&envelope(id, 1), || {
            applied += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(applied, 1);

        let err = cursors.advance(&envelope(id, 3), || Ok(())).unwrap_err();
        assert!(matches!(err, ProjectionError::NonMonotonicSequence { last: 1, found: 3 }));
    }

    #[test]
    fn poisoned_cursors_fail_instead_of_skipping() {
        let cursors = Arc::new(StreamCursors::new());
        let poisoner = Arc::clone(&cursors);
        let _ = thread::spawn(move || {
            let _guard = poisoner.cursors.write().unwrap();
            panic!("writer died holding the cursor lock");
        })
        .join();

        let err = cursors.advance(&envelope(AggregateId::new(), 1), || Ok(())).unwrap_err();
        assert!(matches!(err, ProjectionError::Unavailable(_)));
    }
}
