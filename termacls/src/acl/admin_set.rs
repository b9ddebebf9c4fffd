//! Resolution of the capability keys an account may administer.

use std::collections::HashSet;
use std::hash::Hash;

use tracing::{debug, instrument};

use crate::models::{Account, Capability, CapabilityKind, CustomerId, DeploymentType, GroupId};
use crate::services::{AclError, GrantStore};

/// The keys of one capability kind an account may administer.
///
/// Root accounts resolve to `Unrestricted`, which is never enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminSet<K: Eq + Hash> {
    Unrestricted,
    Restricted(HashSet<K>),
}

impl<K: Eq + Hash> AdminSet<K> {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AdminSet::Unrestricted)
    }

    /// Check membership; `Unrestricted` contains every key.
    pub fn contains(&self, key: &K) -> bool {
        match self {
            AdminSet::Unrestricted => true,
            AdminSet::Restricted(keys) => keys.contains(key),
        }
    }

    /// The enumerated keys, or `None` when unrestricted.
    pub fn keys(&self) -> Option<&HashSet<K>> {
        match self {
            AdminSet::Unrestricted => None,
            AdminSet::Restricted(keys) => Some(keys),
        }
    }

    pub fn into_keys(self) -> Option<HashSet<K>> {
        match self {
            AdminSet::Unrestricted => None,
            AdminSet::Restricted(keys) => Some(keys),
        }
    }
}

/// A typed capability key of one [`CapabilityKind`].
pub trait CapabilityKey: Eq + Hash + Clone + Send + Sync + 'static {
    const KIND: CapabilityKind;

    /// Extract the key if the capability is of this kind.
    fn from_capability(capability: Capability) -> Option<Self>;
}

impl CapabilityKey for DeploymentType {
    const KIND: CapabilityKind = CapabilityKind::Type;

    fn from_capability(capability: Capability) -> Option<Self> {
        match capability {
            Capability::Type(typ) => Some(typ),
            _ => None,
        }
    }
}

impl CapabilityKey for GroupId {
    const KIND: CapabilityKind = CapabilityKind::Group;

    fn from_capability(capability: Capability) -> Option<Self> {
        match capability {
            Capability::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl CapabilityKey for CustomerId {
    const KIND: CapabilityKind = CapabilityKind::Manufacturer;

    fn from_capability(capability: Capability) -> Option<Self> {
        match capability {
            Capability::Manufacturer(customer) => Some(customer),
            _ => None,
        }
    }
}

/// Resolve the admin set of `account` for the capability kind of `K`.
///
/// Root short-circuits to `Unrestricted` without touching the store. The
/// result is never cached; grants may change between calls.
#[instrument(skip(store, account), fields(account_id = %account.id, kind = %K::KIND))]
pub async fn resolve<K, S>(store: &S, account: &Account) -> Result<AdminSet<K>, AclError>
where
    K: CapabilityKey,
    S: GrantStore + ?Sized,
{
    account.validate()?;

    if account.root {
        return Ok(AdminSet::Unrestricted);
    }

    let keys: HashSet<K> = store
        .grant_keys(account.id, K::KIND)
        .await?
        .into_iter()
        .filter_map(K::from_capability)
        .collect();

    debug!(count = keys.len(), "Resolved admin set");

    Ok(AdminSet::Restricted(keys))
}
