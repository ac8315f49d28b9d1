use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use smartstock_core::AccountId;
use smartstock_events::EventEnvelope;
use smartstock_personnel::{PersonnelEvent, PersonnelRequestId, RequestStatus, RequestType};

use super::{EnvelopeProjection, ProjectionError, StreamCursors, aggregate_types, decode};
use crate::read_model::KeyedStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonnelRequestReadModel {
    pub request_id: PersonnelRequestId,
    pub request_type: RequestType,
    pub target_username: String,
    pub target_email: Option<String>,
    pub reason: String,
    pub requested_by: AccountId,
    pub status: RequestStatus,
    pub resolved_by: Option<AccountId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub position: u64,
}

pub struct PersonnelRequestsProjection<S> {
    store: S,
    cursors: StreamCursors,
}

impl<S> PersonnelRequestsProjection<S>
where
    S: KeyedStore<PersonnelRequestId, PersonnelRequestReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, id: &PersonnelRequestId) -> Option<PersonnelRequestReadModel> {
        self.store.get(id)
    }

    /// Every request, newest submission first.
    pub fn list(&self) -> Vec<PersonnelRequestReadModel> {
        let mut out = self.store.list();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.position.cmp(&a.position)));
        out
    }
}

impl<S> EnvelopeProjection for PersonnelRequestsProjection<S>
where
    S: KeyedStore<PersonnelRequestId, PersonnelRequestReadModel>,
{
    fn name(&self) -> &'static str {
        "personnel_requests"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != aggregate_types::PERSONNEL_REQUEST {
            return Ok(());
        }
        self.cursors.advance(envelope, || {
            match decode::<PersonnelEvent>(envelope)? {
                PersonnelEvent::Submitted(e) => {
                    self.store.upsert(
                        e.request_id,
                        PersonnelRequestReadModel {
                            request_id: e.request_id,
                            request_type: e.request_type,
                            target_username: e.target_username,
                            target_email: e.target_email,
                            reason: e.reason,
                            requested_by: e.requested_by,
                            status: RequestStatus::Pending,
                            resolved_by: None,
                            resolved_at: None,
                            created_at: e.occurred_at,
                            position: envelope.global_position(),
                        },
                    )?;
                }
                PersonnelEvent::Resolved(e) => {
                    let mut rm = self.store.get(&e.request_id).ok_or_else(|| {
                        ProjectionError::StreamMismatch(format!("request {} was never submitted", e.request_id))
                    })?;
                    rm.status = e.status;
                    rm.resolved_by = Some(e.resolved_by);
                    rm.resolved_at = Some(e.occurred_at);
                    self.store.upsert(e.request_id, rm)?;
                }
            }
            Ok(())
        })
    }

    fn reset(&self) {
        self.cursors.clear();
        self.store.clear();
    }
}
