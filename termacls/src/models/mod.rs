//! Domain models for termacls.

mod account;
mod grant;
mod inventory;

pub use account::Account;
pub use grant::{Capability, CapabilityKind, Grant};
pub use inventory::{
    AccountId, CustomerId, Deployment, DeploymentId, DeploymentType, GroupId, System, SystemId,
};
