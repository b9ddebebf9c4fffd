//! Grant model - explicit administration rights of an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, CustomerId, DeploymentType, GroupId};

/// The kind of capability key a grant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Deployments (and systems deployed there) of a deployment type.
    Type,
    /// Systems of a hardware group.
    Group,
    /// Systems manufactured by a customer.
    Manufacturer,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Type,
        CapabilityKind::Group,
        CapabilityKind::Manufacturer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Type => "type",
            CapabilityKind::Group => "group",
            CapabilityKind::Manufacturer => "manufacturer",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A capability key: the attribute value a grant targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Capability {
    Type(DeploymentType),
    Group(GroupId),
    Manufacturer(CustomerId),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Type(_) => CapabilityKind::Type,
            Capability::Group(_) => CapabilityKind::Group,
            Capability::Manufacturer(_) => CapabilityKind::Manufacturer,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Type(typ) => write!(f, "type:{}", typ),
            Capability::Group(group) => write!(f, "group:{}", group),
            Capability::Manufacturer(customer) => write!(f, "manufacturer:{}", customer),
        }
    }
}

/// A persisted grant record binding one account to one capability key.
///
/// Grants are facts, not a hierarchy: no grant implies another, and the
/// grants of an account are additive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub account: AccountId,
    pub capability: Capability,
    pub created_utc: DateTime<Utc>,
}

impl Grant {
    /// Create a new grant record.
    pub fn new(account: AccountId, capability: Capability) -> Self {
        Self {
            account,
            capability,
            created_utc: Utc::now(),
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.capability.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_kind() {
        assert_eq!(
            Capability::Type(DeploymentType::from("LOBBY")).kind(),
            CapabilityKind::Type
        );
        assert_eq!(Capability::Group(GroupId(3)).kind(), CapabilityKind::Group);
        assert_eq!(
            Capability::Manufacturer(CustomerId(9)).kind(),
            CapabilityKind::Manufacturer
        );
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(
            Capability::Type(DeploymentType::from("OFFICE")).to_string(),
            "type:OFFICE"
        );
        assert_eq!(Capability::Group(GroupId(3)).to_string(), "group:3");
        assert_eq!(
            Capability::Manufacturer(CustomerId(9)).to_string(),
            "manufacturer:9"
        );
    }

    #[test]
    fn test_grant_kind_follows_capability() {
        let grant = Grant::new(AccountId(1), Capability::Group(GroupId(4)));
        assert_eq!(grant.kind(), CapabilityKind::Group);
        assert_eq!(grant.account, AccountId(1));
    }
}
