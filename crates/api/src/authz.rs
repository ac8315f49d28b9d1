//! API-side authorization guard.
//!
//! Runs before any command is dispatched or any gated read is served. The
//! caller is resolved against the live accounts read model on every call, so
//! a capability change applies to the very next request.

use tracing::warn;

use smartstock_auth::{Capability, CommandAuthorization, Principal, authorize_command};
use smartstock_core::AccountId;
use smartstock_infra::projections::{AccountReadModel, AccountsProjection};
use smartstock_infra::read_model::KeyedStore;

use crate::app::errors::ServiceError;
use crate::context::CallerContext;

/// Capabilities that unlock an operation; any one suffices.
#[derive(Debug, Copy, Clone)]
pub struct Requires(pub &'static [Capability]);

impl CommandAuthorization for Requires {
    fn required_capabilities(&self) -> &[Capability] {
        self.0
    }
}

/// The caller's current principal. Accounts that are missing or no longer
/// active are treated as unauthenticated.
pub fn resolve_principal<S>(accounts: &AccountsProjection<S>, caller: &CallerContext) -> Result<Principal, ServiceError>
where
    S: KeyedStore<AccountId, AccountReadModel>,
{
    match accounts.get(&caller.account_id()) {
        Some(account) if account.is_active() => Ok(account.principal()),
        _ => Err(ServiceError::Unauthenticated),
    }
}

/// Resolve the caller and check `requires` against its live capability set.
pub fn guard<S>(
    accounts: &AccountsProjection<S>,
    caller: &CallerContext,
    requires: Requires,
) -> Result<Principal, ServiceError>
where
    S: KeyedStore<AccountId, AccountReadModel>,
{
    let principal = resolve_principal(accounts, caller)?;
    authorize_command(&principal, &requires).map_err(|e| {
        warn!(username = %principal.username, required = ?requires.0, "permission denied");
        ServiceError::from(e)
    })?;
    Ok(principal)
}
