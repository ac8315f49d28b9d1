//! Account directory read model.
//!
//! Backs login, capability lookups for the authorization guard, and the
//! user/registration listings. Updated in the same dispatch that commits the
//! account event, so a capability change is visible to the very next check.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use smartstock_auth::{AccountEvent, AccountStatus, CapabilitySet, PasswordHash, Principal};
use smartstock_core::AccountId;
use smartstock_events::EventEnvelope;

use super::{EnvelopeProjection, ProjectionError, StreamCursors, aggregate_types, decode};
use crate::read_model::KeyedStore;

#[derive(Debug, Clone)]
pub struct AccountReadModel {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub password: PasswordHash,
    pub status: AccountStatus,
    pub capabilities: CapabilitySet,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountReadModel {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn principal(&self) -> Principal {
        Principal {
            account_id: self.account_id,
            username: self.username.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}

pub struct AccountsProjection<S> {
    store: S,
    emails: RwLock<HashMap<String, AccountId>>,
    cursors: StreamCursors,
}

impl<S> AccountsProjection<S>
where
    S: KeyedStore<AccountId, AccountReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            emails: RwLock::new(HashMap::new()),
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, account_id: &AccountId) -> Option<AccountReadModel> {
        self.store.get(account_id)
    }

    pub fn by_username(&self, username: &str) -> Option<AccountReadModel> {
        let id: AccountId = smartstock_auth::Account::stream_id(username).into();
        self.store.get(&id)
    }

    /// Whether any account in any state already holds `email` (already normalized).
    pub fn email_taken(&self, email: &str) -> bool {
        self.emails.read().map(|m| m.contains_key(email)).unwrap_or(false)
    }

    /// Accounts in `status`, oldest registration first.
    pub fn list_by_status(&self, status: AccountStatus) -> Vec<AccountReadModel> {
        let mut out: Vec<_> = self.store.list().into_iter().filter(|a| a.status == status).collect();
        out.sort_by(|a, b| a.registered_at.cmp(&b.registered_at).then_with(|| a.username.cmp(&b.username)));
        out
    }

    fn update<F>(&self, account_id: AccountId, at: DateTime<Utc>, f: F) -> Result<(), ProjectionError>
    where
        F: FnOnce(&mut AccountReadModel),
    {
        let mut rm = self
            .store
            .get(&account_id)
            .ok_or_else(|| ProjectionError::StreamMismatch(format!("account {account_id} was never registered")))?;
        f(&mut rm);
        rm.updated_at = at;
        self.store.upsert(account_id, rm)?;
        Ok(())
    }

    fn apply_event(&self, event: AccountEvent) -> Result<(), ProjectionError> {
        match event {
            AccountEvent::Registered(e) => {
                self.emails
                    .write()
                    .map_err(|_| ProjectionError::Unavailable("email index lock poisoned".to_string()))?
                    .insert(e.email.clone(), e.account_id);
                self.store.upsert(
                    e.account_id,
                    AccountReadModel {
                        account_id: e.account_id,
                        username: e.username,
                        email: e.email,
                        password: e.password,
                        status: AccountStatus::Pending,
                        capabilities: CapabilitySet::empty(),
                        registered_at: e.occurred_at,
                        updated_at: e.occurred_at,
                    },
                )?;
                Ok(())
            }
            AccountEvent::Activated(e) => self.update(e.account_id, e.occurred_at, |rm| rm.status = AccountStatus::Active),
            AccountEvent::Declined(e) => {
                self.update(e.account_id, e.occurred_at, |rm| rm.status = AccountStatus::Declined)
            }
            AccountEvent::CapabilitiesAssigned(e) => {
                self.update(e.account_id, e.occurred_at, |rm| rm.capabilities = e.capabilities)
            }
        }
    }
}

impl<S> EnvelopeProjection for AccountsProjection<S>
where
    S: KeyedStore<AccountId, AccountReadModel>,
{
    fn name(&self) -> &'static str {
        "accounts"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != aggregate_types::ACCOUNT {
            return Ok(());
        }
        self.cursors.advance(envelope, || {
            let event: AccountEvent = decode(envelope)?;
            self.apply_event(event)
        })
    }

    fn reset(&self) {
        self.cursors.clear();
        self.store.clear();
        if let Ok(mut emails) = self.emails.write() {
            emails.clear();
        }
    }
}
