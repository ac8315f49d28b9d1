//! Account aggregate: registration, activation and capability assignment (event-sourced).
//!
//! The stream id is derived from the username (see [`Account::stream_id`]), so a
//! second registration under the same username lands on an existing stream and
//! is refused regardless of that account's state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartstock_core::{AccountId, Aggregate, AggregateId, AggregateRoot, DomainError};
use smartstock_events::Event;

use crate::{CapabilitySet, PasswordHash};

/// Activation state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Registered, awaiting an approver. Cannot log in.
    #[default]
    Pending,
    /// Approved. May log in; starts with no capabilities.
    Active,
    /// Rejected. Terminal; the record is kept so the username stays reserved.
    Declined,
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "PENDING"),
            AccountStatus::Active => write!(f, "ACTIVE"),
            AccountStatus::Declined => write!(f, "DECLINED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub password: Option<PasswordHash>,
    pub capabilities: CapabilitySet,
    pub status: AccountStatus,
    pub registered_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created: bool,
}

impl Account {
    pub fn empty(id: AccountId) -> Self {
        Self {
            id,
            username: String::new(),
            email: String::new(),
            password: None,
            capabilities: CapabilitySet::empty(),
            status: AccountStatus::Pending,
            registered_at: None,
            version: 0,
            created: false,
        }
    }

    /// Stream id owned by `username`.
    pub fn stream_id(username: &str) -> AggregateId {
        AggregateId::for_natural_key("account", username.trim())
    }

    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> Result<(), DomainError> {
        if self.status != AccountStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action} an account that is {}",
                self.status
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAccount {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub password: PasswordHash,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateAccount {
    pub account_id: AccountId,
    pub approved_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineAccount {
    pub account_id: AccountId,
    pub declined_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Replace the account's capability set wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignCapabilities {
    pub account_id: AccountId,
    pub capabilities: CapabilitySet,
    pub assigned_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountCommand {
    Register(RegisterAccount),
    Activate(ActivateAccount),
    Decline(DeclineAccount),
    AssignCapabilities(AssignCapabilities),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRegistered {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub password: PasswordHash,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountActivated {
    pub account_id: AccountId,
    pub approved_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDeclined {
    pub account_id: AccountId,
    pub declined_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesAssigned {
    pub account_id: AccountId,
    pub capabilities: CapabilitySet,
    pub assigned_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountEvent {
    Registered(AccountRegistered),
    Activated(AccountActivated),
    Declined(AccountDeclined),
    CapabilitiesAssigned(CapabilitiesAssigned),
}

impl Event for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::Registered(_) => "auth.account.registered",
            AccountEvent::Activated(_) => "auth.account.activated",
            AccountEvent::Declined(_) => "auth.account.declined",
            AccountEvent::CapabilitiesAssigned(_) => "auth.account.capabilities_assigned",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::Registered(e) => e.occurred_at,
            AccountEvent::Activated(e) => e.occurred_at,
            AccountEvent::Declined(e) => e.occurred_at,
            AccountEvent::CapabilitiesAssigned(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Account {
    type Command = AccountCommand;
    type Event = AccountEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::Registered(e) => {
                self.id = e.account_id;
                self.username = e.username.clone();
                self.email = e.email.clone();
                self.password = Some(e.password.clone());
                self.capabilities = CapabilitySet::empty();
                self.status = AccountStatus::Pending;
                self.registered_at = Some(e.occurred_at);
                self.created = true;
            }
            AccountEvent::Activated(_) => self.status = AccountStatus::Active,
            AccountEvent::Declined(_) => self.status = AccountStatus::Declined,
            AccountEvent::CapabilitiesAssigned(e) => self.capabilities = e.capabilities.clone(),
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AccountCommand::Register(cmd) => self.handle_register(cmd),
            AccountCommand::Activate(cmd) => {
                self.ensure_created()?;
                self.ensure_pending("activate")?;
                Ok(vec![AccountEvent::Activated(AccountActivated {
                    account_id: self.id,
                    approved_by: cmd.approved_by,
                    occurred_at: cmd.occurred_at,
                })])
            }
            AccountCommand::Decline(cmd) => {
                self.ensure_created()?;
                self.ensure_pending("decline")?;
                Ok(vec![AccountEvent::Declined(AccountDeclined {
                    account_id: self.id,
                    declined_by: cmd.declined_by,
                    occurred_at: cmd.occurred_at,
                })])
            }
            AccountCommand::AssignCapabilities(cmd) => {
                self.ensure_created()?;
                if self.status != AccountStatus::Active {
                    return Err(DomainError::invalid_transition(format!(
                        "cannot assign capabilities to an account that is {}",
                        self.status
                    )));
                }
                Ok(vec![AccountEvent::CapabilitiesAssigned(CapabilitiesAssigned {
                    account_id: self.id,
                    capabilities: cmd.capabilities.clone(),
                    assigned_by: cmd.assigned_by,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl Account {
    fn handle_register(&self, cmd: &RegisterAccount) -> Result<Vec<AccountEvent>, DomainError> {
        if self.created {
            return Err(DomainError::already_exists(format!("username '{}'", self.username)));
        }

        let username = cmd.username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username cannot contain whitespace"));
        }

        let email = normalize_email(&cmd.email)?;

        Ok(vec![AccountEvent::Registered(AccountRegistered {
            account_id: cmd.account_id,
            username: username.to_string(),
            email,
            password: cmd.password.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Trim and lowercase an email, rejecting anything without a local part and a domain.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(DomainError::validation("invalid email format")),
    }
}
