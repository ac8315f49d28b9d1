use thiserror::Error;

use smartstock_core::AccountId;

use crate::{Capability, CapabilitySet};

/// A caller resolved against the live account record.
///
/// `capabilities` must come from the account store at check time, never from
/// anything the caller presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub username: String,
    pub capabilities: CapabilitySet,
}

/// Authorization failure.
///
/// The rendered message is uniform and never names the missing capability;
/// `required` is kept for server-side logging only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("permission denied")]
    PermissionDenied { required: Vec<Capability> },
}

/// Associates an operation with the capabilities that unlock it.
///
/// Holding any one of the listed capabilities is sufficient.
pub trait CommandAuthorization {
    fn required_capabilities(&self) -> &[Capability];
}

pub fn has_capability(principal: &Principal, capability: Capability) -> bool {
    principal.capabilities.contains(capability)
}

/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: Capability) -> Result<(), AuthzError> {
    authorize_any(principal, &[required])
}

pub fn authorize_any(principal: &Principal, any_of: &[Capability]) -> Result<(), AuthzError> {
    if principal.capabilities.contains_any(any_of) {
        Ok(())
    } else {
        Err(AuthzError::PermissionDenied {
            required: any_of.to_vec(),
        })
    }
}

pub fn authorize_command<C: CommandAuthorization + ?Sized>(
    principal: &Principal,
    command: &C,
) -> Result<(), AuthzError> {
    authorize_any(principal, command.required_capabilities())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(caps: &[Capability]) -> Principal {
        Principal {
            account_id: AccountId::new(),
            username: "alice".into(),
            capabilities: caps.iter().copied().collect(),
        }
    }

    #[test]
    fn empty_set_is_denied_everything() {
        let p = principal(&[]);
        for c in Capability::ALL {
            assert!(authorize(&p, c).is_err());
        }
    }

    #[test]
    fn capabilities_do_not_imply_each_other() {
        let p = principal(&[Capability::ManageInventory]);
        assert!(authorize(&p, Capability::ManageInventory).is_ok());
        assert!(authorize(&p, Capability::ViewInventory).is_err());
        assert!(authorize(&p, Capability::ProcessSale).is_err());
    }

    #[test]
    fn any_of_accepts_a_single_match() {
        let p = principal(&[Capability::ProcessSale]);
        let any = [Capability::ViewInventory, Capability::ManageInventory, Capability::ProcessSale];
        assert!(authorize_any(&p, &any).is_ok());
    }

    #[test]
    fn denial_message_does_not_leak_the_capability() {
        let err = authorize(&principal(&[]), Capability::AssignPermission).unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
    }
}
