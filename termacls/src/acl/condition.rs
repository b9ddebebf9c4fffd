//! Conditions selecting administerable entities.
//!
//! A condition is built once from the resolved admin sets and handed to an
//! inventory store, which evaluates it either against its in-memory rows or
//! by rendering it into SQL. Bulk listings and single-entity checks always
//! go through the same condition.

use std::collections::HashSet;

use crate::models::{CustomerId, Deployment, DeploymentType, GroupId, System};

use super::admin_set::AdminSet;

/// A selection over an entity population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition<C> {
    /// Select the whole population.
    All,
    /// Select entities matching at least one clause. No clauses selects nothing.
    AnyOf(Vec<C>),
}

impl<C> Condition<C> {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Condition::All)
    }

    /// Whether the condition can never select anything.
    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::AnyOf(clauses) if clauses.is_empty())
    }

    pub fn clauses(&self) -> &[C] {
        match self {
            Condition::All => &[],
            Condition::AnyOf(clauses) => clauses,
        }
    }
}

/// A membership test on a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentClause {
    TypeIn(HashSet<DeploymentType>),
}

impl DeploymentClause {
    pub fn matches(&self, deployment: &Deployment) -> bool {
        match self {
            DeploymentClause::TypeIn(types) => types.contains(&deployment.typ),
        }
    }
}

/// A membership test on a system, possibly through its current deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemClause {
    ManufacturerIn(HashSet<CustomerId>),
    GroupIn(HashSet<GroupId>),
    /// The system's current deployment has one of these types.
    DeploymentTypeIn(HashSet<DeploymentType>),
    OperatorIs(CustomerId),
}

impl SystemClause {
    /// Evaluate against a system joined with its current deployment.
    pub fn matches(&self, system: &System, deployment: Option<&Deployment>) -> bool {
        match self {
            SystemClause::ManufacturerIn(customers) => customers.contains(&system.manufacturer),
            SystemClause::GroupIn(groups) => system.group.is_some_and(|g| groups.contains(&g)),
            SystemClause::DeploymentTypeIn(types) => {
                deployment.is_some_and(|d| types.contains(&d.typ))
            }
            SystemClause::OperatorIs(customer) => system.operator == Some(*customer),
        }
    }
}

pub type DeploymentCondition = Condition<DeploymentClause>;
pub type SystemCondition = Condition<SystemClause>;

impl Condition<DeploymentClause> {
    /// Deployments whose type is in the admin set.
    pub fn from_types(types: AdminSet<DeploymentType>) -> Self {
        match types.into_keys() {
            None => Condition::All,
            Some(keys) if keys.is_empty() => Condition::AnyOf(Vec::new()),
            Some(keys) => Condition::AnyOf(vec![DeploymentClause::TypeIn(keys)]),
        }
    }

    pub fn matches(&self, deployment: &Deployment) -> bool {
        match self {
            Condition::All => true,
            Condition::AnyOf(clauses) => clauses.iter().any(|c| c.matches(deployment)),
        }
    }
}

impl Condition<SystemClause> {
    pub fn matches(&self, system: &System, deployment: Option<&Deployment>) -> bool {
        match self {
            Condition::All => true,
            Condition::AnyOf(clauses) => clauses.iter().any(|c| c.matches(system, deployment)),
        }
    }
}

/// Accumulates system clauses for a non-root account.
///
/// Empty key sets contribute no clause, so an account without grants ends
/// up with a condition that selects nothing.
#[derive(Debug, Default)]
pub struct SystemConditionBuilder {
    clauses: Vec<SystemClause>,
}

impl SystemConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manufacturers(mut self, customers: HashSet<CustomerId>) -> Self {
        if !customers.is_empty() {
            self.clauses.push(SystemClause::ManufacturerIn(customers));
        }
        self
    }

    pub fn groups(mut self, groups: HashSet<GroupId>) -> Self {
        if !groups.is_empty() {
            self.clauses.push(SystemClause::GroupIn(groups));
        }
        self
    }

    pub fn deployment_types(mut self, types: HashSet<DeploymentType>) -> Self {
        if !types.is_empty() {
            self.clauses.push(SystemClause::DeploymentTypeIn(types));
        }
        self
    }

    pub fn operator(mut self, customer: CustomerId) -> Self {
        self.clauses.push(SystemClause::OperatorIs(customer));
        self
    }

    pub fn build(self) -> SystemCondition {
        Condition::AnyOf(self.clauses)
    }
}
