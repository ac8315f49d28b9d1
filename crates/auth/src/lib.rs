//! `smartstock-auth`: identity and authorization boundary.
//!
//! Decoupled from HTTP and storage: the account aggregate is pure, the guard
//! is a pure function of a resolved [`Principal`], and token handling only
//! deals with bytes and clocks.

pub mod account;
pub mod authorize;
pub mod capability;
pub mod claims;
pub mod password;
pub mod token;

pub use account::{
    Account, AccountActivated, AccountCommand, AccountDeclined, AccountEvent, AccountRegistered, AccountStatus,
    ActivateAccount, AssignCapabilities, CapabilitiesAssigned, DeclineAccount, RegisterAccount, normalize_email,
};
pub use authorize::{
    AuthzError, CommandAuthorization, Principal, authorize, authorize_any, authorize_command,
    has_capability,
};
pub use capability::{Capability, CapabilitySet, UnknownCapability};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHash};
pub use token::{Hs256Tokens, JwtValidator};
