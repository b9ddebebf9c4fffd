//! Storage seams of the access-control layer.

use async_trait::async_trait;

use crate::acl::{DeploymentCondition, SystemCondition};
use crate::models::{
    AccountId, Capability, CapabilityKind, Deployment, DeploymentId, Grant, System, SystemId,
};

use super::AclError;

/// Persisted grant records.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Capability keys of `kind` granted to `account`.
    async fn grant_keys(
        &self,
        account: AccountId,
        kind: CapabilityKind,
    ) -> Result<Vec<Capability>, AclError>;

    /// All grants of `account`, of every kind.
    async fn list_grants(&self, account: AccountId) -> Result<Vec<Grant>, AclError>;

    /// Record a grant. Returns false if it already existed.
    async fn insert_grant(
        &self,
        account: AccountId,
        capability: &Capability,
    ) -> Result<bool, AclError>;

    /// Remove a grant. Returns false if there was nothing to remove.
    async fn revoke_grant(
        &self,
        account: AccountId,
        capability: &Capability,
    ) -> Result<bool, AclError>;
}

/// Read access to the hardware inventory.
///
/// `only` narrows the population to a single entity before the condition is
/// applied; single-entity checks are answered by testing the result for
/// emptiness. Results are ordered by id.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn select_deployments(
        &self,
        condition: &DeploymentCondition,
        only: Option<DeploymentId>,
    ) -> Result<Vec<Deployment>, AclError>;

    async fn select_systems(
        &self,
        condition: &SystemCondition,
        only: Option<SystemId>,
    ) -> Result<Vec<System>, AclError>;
}

/// A store backing the whole decision layer.
pub trait AclStore: GrantStore + InventoryStore {}

impl<T: GrantStore + InventoryStore> AclStore for T {}
