//! The authorization decision model.

mod admin_set;
mod condition;
mod decision;
mod policy;

pub use admin_set::{resolve, AdminSet, CapabilityKey};
pub use condition::{
    Condition, DeploymentClause, DeploymentCondition, SystemClause, SystemCondition,
    SystemConditionBuilder,
};
pub use decision::AccessControl;
pub use policy::{SystemChannel, SystemPolicy};
