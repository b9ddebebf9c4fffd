//! Decision functions: the public contract of the access-control layer.
//!
//! Every single-entity check is answered by the same store selection that
//! backs the corresponding listing, narrowed to that one entity. There is no
//! second code path that could disagree with the listings.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::models::{
    Account, CustomerId, Deployment, DeploymentId, DeploymentType, GroupId, System, SystemId,
};
use crate::services::metrics::record_decision;
use crate::services::{AclError, AclStore};

use super::admin_set::{resolve, CapabilityKey};
use super::condition::{Condition, DeploymentCondition, SystemCondition, SystemConditionBuilder};
use super::policy::{SystemChannel, SystemPolicy};

/// Authorization decisions over a shared store.
///
/// Holds no mutable state; clones share the store.
#[derive(Clone)]
pub struct AccessControl {
    store: Arc<dyn AclStore>,
    policy: SystemPolicy,
}

impl std::fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessControl")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AccessControl {
    pub fn new(store: Arc<dyn AclStore>, policy: SystemPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SystemPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn AclStore> {
        &self.store
    }

    /// Explicitly granted keys of kind `K`. Callers must handle root first.
    async fn granted<K: CapabilityKey>(&self, account: &Account) -> Result<HashSet<K>, AclError> {
        Ok(resolve::<K, _>(self.store.as_ref(), account)
            .await?
            .into_keys()
            .unwrap_or_default())
    }

    // ==================== Conditions ====================

    /// Condition selecting the deployments `account` may administer.
    pub async fn deployment_admin_condition(
        &self,
        account: &Account,
    ) -> Result<DeploymentCondition, AclError> {
        let types = resolve::<DeploymentType, _>(self.store.as_ref(), account).await?;
        Ok(DeploymentCondition::from_types(types))
    }

    /// Condition selecting the systems `account` may administer, OR-ing the
    /// channels of the configured policy.
    pub async fn system_admin_condition(
        &self,
        account: &Account,
    ) -> Result<SystemCondition, AclError> {
        account.validate()?;
        if account.root {
            return Ok(Condition::All);
        }

        let mut builder = SystemConditionBuilder::new();
        for channel in self.policy.channels() {
            builder = match channel {
                SystemChannel::Manufacturer => {
                    builder.manufacturers(self.granted::<CustomerId>(account).await?)
                }
                SystemChannel::Group => builder.groups(self.granted::<GroupId>(account).await?),
                SystemChannel::DeploymentType => {
                    builder.deployment_types(self.granted::<DeploymentType>(account).await?)
                }
                SystemChannel::Operator => builder.operator(account.customer),
            };
        }
        Ok(builder.build())
    }

    /// Condition selecting the systems `account` may set up.
    ///
    /// A customer may always set up hardware it manufactured.
    pub async fn system_setup_condition(
        &self,
        account: &Account,
    ) -> Result<SystemCondition, AclError> {
        account.validate()?;
        if account.root {
            return Ok(Condition::All);
        }

        let mut manufacturers = self.granted::<CustomerId>(account).await?;
        manufacturers.insert(account.customer);
        Ok(SystemConditionBuilder::new()
            .manufacturers(manufacturers)
            .build())
    }

    // ==================== Listings ====================

    /// Deployments `account` may administer, ordered by id.
    #[instrument(skip_all, fields(account_id = %account.id, root = account.root))]
    pub async fn get_administerable_deployments(
        &self,
        account: &Account,
    ) -> Result<Vec<Deployment>, AclError> {
        let condition = self.deployment_admin_condition(account).await?;
        self.store.select_deployments(&condition, None).await
    }

    /// Systems `account` may administer, ordered by id.
    #[instrument(skip_all, fields(account_id = %account.id, root = account.root))]
    pub async fn get_administerable_systems(
        &self,
        account: &Account,
    ) -> Result<Vec<System>, AclError> {
        let condition = self.system_admin_condition(account).await?;
        self.store.select_systems(&condition, None).await
    }

    /// Systems `account` may set up, ordered by id.
    #[instrument(skip_all, fields(account_id = %account.id, root = account.root))]
    pub async fn get_setupable_systems(&self, account: &Account) -> Result<Vec<System>, AclError> {
        let condition = self.system_setup_condition(account).await?;
        self.store.select_systems(&condition, None).await
    }

    // ==================== Single-entity decisions ====================

    async fn selects_deployment(
        &self,
        condition: &DeploymentCondition,
        deployment: DeploymentId,
    ) -> Result<bool, AclError> {
        Ok(!self
            .store
            .select_deployments(condition, Some(deployment))
            .await?
            .is_empty())
    }

    async fn selects_system(
        &self,
        condition: &SystemCondition,
        system: SystemId,
    ) -> Result<bool, AclError> {
        Ok(!self
            .store
            .select_systems(condition, Some(system))
            .await?
            .is_empty())
    }

    /// Check whether `account` may administer the deployment.
    #[instrument(skip_all, fields(account_id = %account.id, deployment_id = %deployment))]
    pub async fn can_administer_deployment(
        &self,
        account: &Account,
        deployment: DeploymentId,
    ) -> Result<bool, AclError> {
        let result = async {
            let condition = self.deployment_admin_condition(account).await?;
            self.selects_deployment(&condition, deployment).await
        }
        .await;
        finish("can_administer_deployment", result)
    }

    /// Check whether `account` may administer the system.
    #[instrument(skip_all, fields(account_id = %account.id, system_id = %system))]
    pub async fn can_administer_system(
        &self,
        account: &Account,
        system: SystemId,
    ) -> Result<bool, AclError> {
        let result = async {
            let condition = self.system_admin_condition(account).await?;
            self.selects_system(&condition, system).await
        }
        .await;
        finish("can_administer_system", result)
    }

    /// Check whether `account` may deploy `system` at `deployment`.
    ///
    /// Requires authority over the system, over the target deployment (if
    /// any), and over the deployment the system currently sits at (if any).
    /// The current deployment is taken from `system` as passed in.
    #[instrument(
        skip_all,
        fields(
            account_id = %account.id,
            system_id = %system.id,
            target = ?deployment,
            current = ?system.deployment
        )
    )]
    pub async fn can_deploy(
        &self,
        account: &Account,
        system: &System,
        deployment: Option<DeploymentId>,
    ) -> Result<bool, AclError> {
        let result = async {
            let systems = self.system_admin_condition(account).await?;
            if !self.selects_system(&systems, system.id).await? {
                return Ok(false);
            }

            let deployments = self.deployment_admin_condition(account).await?;
            for site in deployment.into_iter().chain(system.deployment) {
                if !self.selects_deployment(&deployments, site).await? {
                    debug!(deployment_id = %site, "Deployment not administerable");
                    return Ok(false);
                }
            }

            Ok(true)
        }
        .await;
        finish("can_deploy", result)
    }

    /// Check whether `account` may set up the system.
    #[instrument(skip_all, fields(account_id = %account.id, system_id = %system))]
    pub async fn can_setup_system(
        &self,
        account: &Account,
        system: SystemId,
    ) -> Result<bool, AclError> {
        let result = async {
            let condition = self.system_setup_condition(account).await?;
            self.selects_system(&condition, system).await
        }
        .await;
        finish("can_setup_system", result)
    }
}

fn finish(operation: &'static str, result: Result<bool, AclError>) -> Result<bool, AclError> {
    record_decision(operation, &result);
    match &result {
        Ok(false) => debug!(operation = operation, "Access denied"),
        Err(e) => warn!(operation = operation, error = %e, "Decision failed"),
        Ok(true) => {}
    }
    result
}
