use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartstock_core::{AccountId, Aggregate, AggregateId, AggregateRoot, DomainError};
use smartstock_events::Event;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonnelRequestId(pub AggregateId);

impl PersonnelRequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PersonnelRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Create,
    Delete,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Outcome chosen by the resolver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for RequestStatus {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// Aggregate root: PersonnelRequest.
///
/// # Invariants
/// - Created PENDING.
/// - Leaves PENDING at most once; terminal states are immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonnelRequest {
    id: PersonnelRequestId,
    request_type: Option<RequestType>,
    target_username: String,
    status: RequestStatus,
    resolved_by: Option<AccountId>,
    version: u64,
    created: bool,
}

impl PersonnelRequest {
    pub fn empty(id: PersonnelRequestId) -> Self {
        Self {
            id,
            request_type: None,
            target_username: String::new(),
            status: RequestStatus::Pending,
            resolved_by: None,
            version: 0,
            created: false,
        }
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn resolved_by(&self) -> Option<AccountId> {
        self.resolved_by
    }
}

impl AggregateRoot for PersonnelRequest {
    type Id = PersonnelRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub request_id: PersonnelRequestId,
    pub request_type: RequestType,
    pub target_username: String,
    pub target_email: Option<String>,
    pub reason: String,
    pub requested_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub request_id: PersonnelRequestId,
    pub decision: Decision,
    pub resolved_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonnelCommand {
    Submit(SubmitRequest),
    Resolve(ResolveRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSubmitted {
    pub request_id: PersonnelRequestId,
    pub request_type: RequestType,
    pub target_username: String,
    pub target_email: Option<String>,
    pub reason: String,
    pub requested_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Published for downstream provisioning; nothing in this crate acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResolved {
    pub request_id: PersonnelRequestId,
    pub request_type: RequestType,
    pub target_username: String,
    pub status: RequestStatus,
    pub resolved_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonnelEvent {
    Submitted(RequestSubmitted),
    Resolved(RequestResolved),
}

impl Event for PersonnelEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PersonnelEvent::Submitted(_) => "personnel.request.submitted",
            PersonnelEvent::Resolved(_) => "personnel.request.resolved",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PersonnelEvent::Submitted(e) => e.occurred_at,
            PersonnelEvent::Resolved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PersonnelRequest {
    type Command = PersonnelCommand;
    type Event = PersonnelEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PersonnelEvent::Submitted(e) => {
                self.id = e.request_id;
                self.request_type = Some(e.request_type);
                self.target_username = e.target_username.clone();
                self.status = RequestStatus::Pending;
                self.created = true;
            }
            PersonnelEvent::Resolved(e) => {
                self.status = e.status;
                self.resolved_by = Some(e.resolved_by);
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PersonnelCommand::Submit(cmd) => self.handle_submit(cmd),
            PersonnelCommand::Resolve(cmd) => self.handle_resolve(cmd),
        }
    }
}

impl PersonnelRequest {
    fn handle_submit(&self, cmd: &SubmitRequest) -> Result<Vec<PersonnelEvent>, DomainError> {
        if self.created {
            return Err(DomainError::already_exists(format!("request {}", self.id)));
        }

        let target_username = cmd.target_username.trim();
        if target_username.is_empty() {
            return Err(DomainError::validation("target username cannot be empty"));
        }

        let target_email = match cmd.target_email.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => {
                let (local, domain) = e
                    .split_once('@')
                    .ok_or_else(|| DomainError::validation("invalid target email"))?;
                if local.is_empty() || domain.is_empty() {
                    return Err(DomainError::validation("invalid target email"));
                }
                Some(e.to_lowercase())
            }
            _ => None,
        };
        if cmd.request_type == RequestType::Create && target_email.is_none() {
            return Err(DomainError::validation("a CREATE request needs a target email"));
        }

        Ok(vec![PersonnelEvent::Submitted(RequestSubmitted {
            request_id: cmd.request_id,
            request_type: cmd.request_type,
            target_username: target_username.to_string(),
            target_email,
            reason: cmd.reason.trim().to_string(),
            requested_by: cmd.requested_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_resolve(&self, cmd: &ResolveRequest) -> Result<Vec<PersonnelEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.status != RequestStatus::Pending {
            return Err(DomainError::AlreadyResolved);
        }
        let request_type = self
            .request_type
            .ok_or_else(|| DomainError::invariant("request has no type"))?;

        Ok(vec![PersonnelEvent::Resolved(RequestResolved {
            request_id: self.id,
            request_type,
            target_username: self.target_username.clone(),
            status: cmd.decision.into(),
            resolved_by: cmd.resolved_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}
