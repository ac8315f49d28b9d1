use smartstock_core::AccountId;

/// Identity of the caller, taken from a verified bearer token.
///
/// Carries identity only. Capabilities are looked up on the live account for
/// every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    account_id: AccountId,
    username: String,
}

impl CallerContext {
    pub fn new(account_id: AccountId, username: impl Into<String>) -> Self {
        Self {
            account_id,
            username: username.into(),
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
