//! In-memory store for tests and for embedders without a database.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::acl::{DeploymentCondition, SystemCondition};
use crate::models::{
    AccountId, Capability, CapabilityKind, Deployment, DeploymentId, Grant, System, SystemId,
};

use super::{AclError, GrantStore, InventoryStore};

type GrantTable = BTreeMap<AccountId, BTreeMap<Capability, DateTime<Utc>>>;

/// Grants and inventory held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    grants: RwLock<GrantTable>,
    deployments: RwLock<BTreeMap<DeploymentId, Deployment>>,
    systems: RwLock<BTreeMap<SystemId, System>>,
}

fn poisoned<E: std::fmt::Display>(table: &'static str) -> impl FnOnce(E) -> AclError {
    move |e| AclError::Store(format!("{} table lock poisoned: {}", table, e))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a deployment.
    pub fn put_deployment(&self, deployment: Deployment) -> Result<(), AclError> {
        self.deployments
            .write()
            .map_err(poisoned("deployment"))?
            .insert(deployment.id, deployment);
        Ok(())
    }

    /// Insert or replace a system.
    pub fn put_system(&self, system: System) -> Result<(), AclError> {
        self.systems
            .write()
            .map_err(poisoned("system"))?
            .insert(system.id, system);
        Ok(())
    }

    pub fn remove_system(&self, id: SystemId) -> Result<Option<System>, AclError> {
        Ok(self
            .systems
            .write()
            .map_err(poisoned("system"))?
            .remove(&id))
    }

    pub fn remove_deployment(&self, id: DeploymentId) -> Result<Option<Deployment>, AclError> {
        Ok(self
            .deployments
            .write()
            .map_err(poisoned("deployment"))?
            .remove(&id))
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn grant_keys(
        &self,
        account: AccountId,
        kind: CapabilityKind,
    ) -> Result<Vec<Capability>, AclError> {
        let grants = self.grants.read().map_err(poisoned("grant"))?;
        Ok(grants
            .get(&account)
            .map(|caps| caps.keys().filter(|c| c.kind() == kind).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_grants(&self, account: AccountId) -> Result<Vec<Grant>, AclError> {
        let grants = self.grants.read().map_err(poisoned("grant"))?;
        Ok(grants
            .get(&account)
            .map(|caps| {
                caps.iter()
                    .map(|(capability, created_utc)| Grant {
                        account,
                        capability: capability.clone(),
                        created_utc: *created_utc,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_grant(
        &self,
        account: AccountId,
        capability: &Capability,
    ) -> Result<bool, AclError> {
        let mut grants = self.grants.write().map_err(poisoned("grant"))?;
        let caps = grants.entry(account).or_default();
        if caps.contains_key(capability) {
            return Ok(false);
        }
        caps.insert(capability.clone(), Utc::now());
        Ok(true)
    }

    async fn revoke_grant(
        &self,
        account: AccountId,
        capability: &Capability,
    ) -> Result<bool, AclError> {
        let mut grants = self.grants.write().map_err(poisoned("grant"))?;
        let removed = grants
            .get_mut(&account)
            .is_some_and(|caps| caps.remove(capability).is_some());
        Ok(removed)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn select_deployments(
        &self,
        condition: &DeploymentCondition,
        only: Option<DeploymentId>,
    ) -> Result<Vec<Deployment>, AclError> {
        let deployments = self.deployments.read().map_err(poisoned("deployment"))?;
        Ok(deployments
            .values()
            .filter(|d| only.is_none_or(|id| d.id == id))
            .filter(|d| condition.matches(d))
            .cloned()
            .collect())
    }

    async fn select_systems(
        &self,
        condition: &SystemCondition,
        only: Option<SystemId>,
    ) -> Result<Vec<System>, AclError> {
        let systems = self.systems.read().map_err(poisoned("system"))?;
        let deployments = self.deployments.read().map_err(poisoned("deployment"))?;
        Ok(systems
            .values()
            .filter(|s| only.is_none_or(|id| s.id == id))
            .filter(|s| {
                // left join on the current deployment
                let current = s.deployment.and_then(|id| deployments.get(&id));
                condition.matches(s, current)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{Condition, SystemClause};
    use crate::models::{CustomerId, DeploymentType, GroupId};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_insert_grant_is_idempotent() {
        let store = MemoryStore::new();
        let cap = Capability::Group(GroupId(1));

        assert!(store.insert_grant(AccountId(1), &cap).await.unwrap());
        assert!(!store.insert_grant(AccountId(1), &cap).await.unwrap());
        assert_eq!(store.list_grants(AccountId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_grant() {
        let store = MemoryStore::new();
        let cap = Capability::Type(DeploymentType::from("LOBBY"));

        assert!(!store.revoke_grant(AccountId(1), &cap).await.unwrap());
        store.insert_grant(AccountId(1), &cap).await.unwrap();
        assert!(store.revoke_grant(AccountId(1), &cap).await.unwrap());
        assert!(store
            .grant_keys(AccountId(1), CapabilityKind::Type)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_select_systems_joins_current_deployment() {
        let store = MemoryStore::new();
        store.put_deployment(Deployment::new(1, "LOBBY")).unwrap();
        store.put_system(System::new(1, 5).with_deployment(1)).unwrap();
        store.put_system(System::new(2, 5)).unwrap();
        // dangling deployment reference behaves like a left join miss
        store.put_system(System::new(3, 5).with_deployment(99)).unwrap();

        let condition = Condition::AnyOf(vec![SystemClause::DeploymentTypeIn(HashSet::from([
            DeploymentType::from("LOBBY"),
        ]))]);
        let systems = store.select_systems(&condition, None).await.unwrap();
        assert_eq!(
            systems.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![SystemId(1)]
        );
    }

    #[tokio::test]
    async fn test_select_only_narrows_population() {
        let store = MemoryStore::new();
        store.put_system(System::new(1, 5)).unwrap();
        store.put_system(System::new(2, 5)).unwrap();

        let all = store
            .select_systems(&Condition::All, Some(SystemId(2)))
            .await
            .unwrap();
        assert_eq!(all, vec![System::new(2, 5)]);

        let missing = store
            .select_systems(&Condition::All, Some(SystemId(3)))
            .await
            .unwrap();
        assert!(missing.is_empty());

        let manufacturer = Condition::AnyOf(vec![SystemClause::ManufacturerIn(HashSet::from([
            CustomerId(6),
        ]))]);
        assert!(store
            .select_systems(&manufacturer, Some(SystemId(1)))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_listings_are_ordered_by_id() {
        let store = MemoryStore::new();
        for id in [3, 1, 2] {
            store.put_deployment(Deployment::new(id, "LOBBY")).unwrap();
        }
        let ids: Vec<_> = store
            .select_deployments(&Condition::All, None)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
