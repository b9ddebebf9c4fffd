//! termacls - Access control for administering and setting up fleet systems
//! and their deployments.

pub mod acl;
pub mod config;
pub mod models;
pub mod services;
pub mod startup;

pub use acl::{AccessControl, SystemChannel, SystemPolicy};
pub use models::{Account, Deployment, DeploymentId, System, SystemId};
pub use services::AclError;
