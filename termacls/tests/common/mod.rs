#![allow(dead_code)]

use std::sync::{Arc, Once};

use termacls::acl::{AccessControl, SystemPolicy};
use termacls::models::{
    Account, Capability, CustomerId, Deployment, DeploymentType, GroupId, System,
};
use termacls::services::{GrantStore, MemoryStore};

static INIT_TRACING: Once = Once::new();

/// Route test logs through the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Deployments of the test fleet. Matches `tests/fixtures/inventory.sql`.
pub fn deployments() -> Vec<Deployment> {
    vec![
        Deployment::new(1, "LOBBY"),
        Deployment::new(2, "OFFICE"),
        Deployment::new(3, "LOBBY"),
    ]
}

/// Systems of the test fleet. Matches `tests/fixtures/inventory.sql`.
pub fn systems() -> Vec<System> {
    vec![
        System::new(10, 100).with_group(7).with_deployment(1),
        System::new(11, 100).with_deployment(2).with_operator(300),
        System::new(12, 200).with_group(7),
        System::new(13, 200)
            .with_group(8)
            .with_deployment(3)
            .with_operator(300),
        System::new(14, 300),
    ]
}

pub fn fleet() -> Arc<MemoryStore> {
    init_tracing();
    let store = MemoryStore::new();
    for deployment in deployments() {
        store.put_deployment(deployment).unwrap();
    }
    for system in systems() {
        store.put_system(system).unwrap();
    }
    Arc::new(store)
}

pub fn access_control(store: Arc<MemoryStore>, policy: SystemPolicy) -> AccessControl {
    AccessControl::new(store, policy)
}

pub fn lobby() -> Capability {
    Capability::Type(DeploymentType::from("LOBBY"))
}

pub fn office() -> Capability {
    Capability::Type(DeploymentType::from("OFFICE"))
}

pub fn group(id: i64) -> Capability {
    Capability::Group(GroupId(id))
}

pub fn manufacturer(id: i64) -> Capability {
    Capability::Manufacturer(CustomerId(id))
}

pub async fn grant<S: GrantStore + ?Sized>(store: &S, account: &Account, capability: Capability) {
    store.insert_grant(account.id, &capability).await.unwrap();
}

pub fn system_ids(systems: &[System]) -> Vec<i64> {
    systems.iter().map(|s| s.id.0).collect()
}

pub fn deployment_ids(deployments: &[Deployment]) -> Vec<i64> {
    deployments.iter().map(|d| d.id.0).collect()
}
