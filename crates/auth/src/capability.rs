use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smartstock_core::ValueObject;

/// Closed vocabulary of grantable capabilities.
///
/// Capabilities are orthogonal: holding one implies nothing about any other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    ViewInventory,
    ManageInventory,
    ProcessSale,
    ViewUserList,
    CreateUserRequest,
    ApproveUserCreation,
    AssignPermission,
    ViewRequests,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::ViewInventory,
        Capability::ManageInventory,
        Capability::ProcessSale,
        Capability::ViewUserList,
        Capability::CreateUserRequest,
        Capability::ApproveUserCreation,
        Capability::AssignPermission,
        Capability::ViewRequests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewInventory => "VIEW_INVENTORY",
            Capability::ManageInventory => "MANAGE_INVENTORY",
            Capability::ProcessSale => "PROCESS_SALE",
            Capability::ViewUserList => "VIEW_USER_LIST",
            Capability::CreateUserRequest => "CREATE_USER_REQUEST",
            Capability::ApproveUserCreation => "APPROVE_USER_CREATION",
            Capability::AssignPermission => "ASSIGN_PERMISSION",
            Capability::ViewRequests => "VIEW_REQUESTS",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// The full set of capabilities held by one account.
///
/// Assignment always replaces the whole set; there is no incremental grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl ValueObject for CapabilitySet {}

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    /// Parse a list of capability names; any name outside the vocabulary fails the whole parse.
    pub fn from_names<I, S>(names: I) -> Result<Self, UnknownCapability>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| n.as_ref().parse::<Capability>())
            .collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn contains_any(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.as_str()).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        for c in Capability::ALL {
            assert_eq!(c.as_str().parse::<Capability>().unwrap(), c);
        }
    }

    #[test]
    fn one_unknown_name_rejects_the_whole_set() {
        let err = CapabilitySet::from_names(["VIEW_INVENTORY", "DELETE_EVERYTHING"]).unwrap_err();
        assert_eq!(err.0, "DELETE_EVERYTHING");
    }

    #[test]
    fn duplicates_collapse() {
        let set = CapabilitySet::from_names(["PROCESS_SALE", "PROCESS_SALE"]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serializes_as_screaming_snake_names() {
        let set: CapabilitySet = [Capability::ManageInventory].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["MANAGE_INVENTORY"]"#);
    }
}
