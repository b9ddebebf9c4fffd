//! Hardware inventory entities as seen by the access-control layer.
//!
//! Systems and deployments are owned by the hardware database. Only the
//! identity and the attributes that gate administration are mapped here.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            sqlx::Type,
        )]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identity of an authenticated account.
    AccountId
);
id_type!(
    /// Identity of a customer, which is also the manufacturer/operator of systems.
    CustomerId
);
id_type!(
    /// Identity of a hardware group.
    GroupId
);
id_type!(
    /// Identity of a system.
    SystemId
);
id_type!(
    /// Identity of a deployment.
    DeploymentId
);

/// Deployment type, the capability key that gates deployment administration.
///
/// The set of types is owned by the hardware database, so the value is kept
/// open rather than mapped onto a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct DeploymentType(pub String);

impl DeploymentType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeploymentType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A site where systems are installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Deployment {
    pub id: DeploymentId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub typ: DeploymentType,
}

impl Deployment {
    pub fn new(id: i64, typ: &str) -> Self {
        Self {
            id: DeploymentId(id),
            typ: DeploymentType::from(typ),
        }
    }
}

/// A piece of hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct System {
    pub id: SystemId,
    /// Customer that manufactured the system.
    pub manufacturer: CustomerId,
    pub group: Option<GroupId>,
    /// Current deployment assignment, if any.
    pub deployment: Option<DeploymentId>,
    /// Customer that operates the system, if any.
    pub operator: Option<CustomerId>,
}

impl System {
    pub fn new(id: i64, manufacturer: i64) -> Self {
        Self {
            id: SystemId(id),
            manufacturer: CustomerId(manufacturer),
            group: None,
            deployment: None,
            operator: None,
        }
    }

    pub fn with_group(mut self, group: i64) -> Self {
        self.group = Some(GroupId(group));
        self
    }

    pub fn with_deployment(mut self, deployment: i64) -> Self {
        self.deployment = Some(DeploymentId(deployment));
        self
    }

    pub fn with_operator(mut self, operator: i64) -> Self {
        self.operator = Some(CustomerId(operator));
        self
    }

    /// Check if the system is currently deployed somewhere.
    pub fn is_deployed(&self) -> bool {
        self.deployment.is_some()
    }
}
