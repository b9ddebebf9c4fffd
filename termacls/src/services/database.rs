//! PostgreSQL store for grants and the hardware inventory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::acl::{DeploymentClause, DeploymentCondition, SystemClause, SystemCondition};
use crate::config::DatabaseConfig;
use crate::models::{
    AccountId, Capability, CapabilityKind, CustomerId, Deployment, DeploymentId, DeploymentType,
    Grant, GroupId, System, SystemId,
};
use crate::services::metrics::STORE_QUERY_DURATION;

use super::{AclError, GrantStore, InventoryStore};

/// Hardware database table holding systems.
pub const SYSTEM_TABLE: &str = "system";
/// Hardware database table holding deployments.
pub const DEPLOYMENT_TABLE: &str = "deployment";

/// Grant table and key column for a capability kind.
fn grant_table(kind: CapabilityKind) -> (&'static str, &'static str) {
    match kind {
        CapabilityKind::Type => ("type_admin", "\"type\""),
        CapabilityKind::Group => ("group_admin", "\"group\""),
        CapabilityKind::Manufacturer => ("manufacturer_admin", "manufacturer"),
    }
}

fn log_db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AclError {
    move |e| {
        warn!(operation = operation, error = %e, "Store query failed");
        AclError::Database(e)
    }
}

/// PostgreSQL connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool.
    #[instrument(skip(config), fields(service = "termacls"))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AclError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                AclError::Database(e)
            })?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AclError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(log_db_error("health_check"))?;
        Ok(())
    }

    /// Create the grant tables.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AclError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn grants_of_kind(
        &self,
        account: AccountId,
        kind: CapabilityKind,
    ) -> Result<Vec<Grant>, AclError> {
        let (table, column) = grant_table(kind);
        let sql = format!(
            "SELECT {column}, created_utc FROM {table} WHERE account = $1 ORDER BY id",
            column = column,
            table = table
        );

        let grants = match kind {
            CapabilityKind::Type => {
                sqlx::query_as::<_, (DeploymentType, DateTime<Utc>)>(&sql)
                    .bind(account)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(log_db_error("grants_of_kind"))?
                    .into_iter()
                    .map(|(key, created_utc)| (Capability::Type(key), created_utc))
                    .collect::<Vec<_>>()
            }
            CapabilityKind::Group => sqlx::query_as::<_, (GroupId, DateTime<Utc>)>(&sql)
                .bind(account)
                .fetch_all(&self.pool)
                .await
                .map_err(log_db_error("grants_of_kind"))?
                .into_iter()
                .map(|(key, created_utc)| (Capability::Group(key), created_utc))
                .collect(),
            CapabilityKind::Manufacturer => {
                sqlx::query_as::<_, (CustomerId, DateTime<Utc>)>(&sql)
                    .bind(account)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(log_db_error("grants_of_kind"))?
                    .into_iter()
                    .map(|(key, created_utc)| (Capability::Manufacturer(key), created_utc))
                    .collect()
            }
        };

        Ok(grants
            .into_iter()
            .map(|(capability, created_utc)| Grant {
                account,
                capability,
                created_utc,
            })
            .collect())
    }
}

/// Bind the key of a capability as the next query argument.
fn push_capability_key(query: &mut QueryBuilder<'_, Postgres>, capability: &Capability) {
    match capability {
        Capability::Type(typ) => query.push_bind(typ.0.clone()),
        Capability::Group(group) => query.push_bind(group.0),
        Capability::Manufacturer(customer) => query.push_bind(customer.0),
    };
}

/// Render a deployment condition; deployments are aliased `d`.
pub(crate) fn push_deployment_condition(
    query: &mut QueryBuilder<'_, Postgres>,
    condition: &DeploymentCondition,
) {
    let clauses = match condition {
        DeploymentCondition::All => {
            query.push("TRUE");
            return;
        }
        DeploymentCondition::AnyOf(clauses) if clauses.is_empty() => {
            query.push("FALSE");
            return;
        }
        DeploymentCondition::AnyOf(clauses) => clauses,
    };

    query.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        match clause {
            DeploymentClause::TypeIn(types) => {
                query.push("d.\"type\" = ANY(");
                query.push_bind(types.iter().map(|t| t.0.clone()).collect::<Vec<String>>());
                query.push(")");
            }
        }
    }
    query.push(")");
}

/// Render a system condition; systems are aliased `s`, their current
/// deployment `d` (left joined).
pub(crate) fn push_system_condition(
    query: &mut QueryBuilder<'_, Postgres>,
    condition: &SystemCondition,
) {
    let clauses = match condition {
        SystemCondition::All => {
            query.push("TRUE");
            return;
        }
        SystemCondition::AnyOf(clauses) if clauses.is_empty() => {
            query.push("FALSE");
            return;
        }
        SystemCondition::AnyOf(clauses) => clauses,
    };

    query.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        match clause {
            SystemClause::ManufacturerIn(customers) => {
                query.push("s.manufacturer = ANY(");
                query.push_bind(customers.iter().map(|c| c.0).collect::<Vec<i64>>());
                query.push(")");
            }
            SystemClause::GroupIn(groups) => {
                query.push("s.\"group\" = ANY(");
                query.push_bind(groups.iter().map(|g| g.0).collect::<Vec<i64>>());
                query.push(")");
            }
            SystemClause::DeploymentTypeIn(types) => {
                query.push("d.\"type\" = ANY(");
                query.push_bind(types.iter().map(|t| t.0.clone()).collect::<Vec<String>>());
                query.push(")");
            }
            SystemClause::OperatorIs(customer) => {
                query.push("s.operator = ");
                query.push_bind(customer.0);
            }
        }
    }
    query.push(")");
}

pub(crate) fn deployment_query<'a>(
    condition: &DeploymentCondition,
    only: Option<DeploymentId>,
) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT d.id, d.\"type\" FROM {} d WHERE ",
        DEPLOYMENT_TABLE
    ));
    push_deployment_condition(&mut query, condition);
    if let Some(id) = only {
        query.push(" AND d.id = ").push_bind(id.0);
    }
    query.push(" ORDER BY d.id");
    query
}

pub(crate) fn system_query<'a>(
    condition: &SystemCondition,
    only: Option<SystemId>,
) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT s.id, s.manufacturer, s.\"group\", s.deployment, s.operator \
         FROM {} s LEFT JOIN {} d ON d.id = s.deployment WHERE ",
        SYSTEM_TABLE, DEPLOYMENT_TABLE
    ));
    push_system_condition(&mut query, condition);
    if let Some(id) = only {
        query.push(" AND s.id = ").push_bind(id.0);
    }
    query.push(" ORDER BY s.id");
    query
}

#[async_trait]
impl GrantStore for Database {
    #[instrument(skip_all, fields(account_id = %account, kind = %kind))]
    async fn grant_keys(
        &self,
        account: AccountId,
        kind: CapabilityKind,
    ) -> Result<Vec<Capability>, AclError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["grant_keys"])
            .start_timer();

        let keys = self
            .grants_of_kind(account, kind)
            .await?
            .into_iter()
            .map(|grant| grant.capability)
            .collect();

        timer.observe_duration();
        Ok(keys)
    }

    #[instrument(skip_all, fields(account_id = %account))]
    async fn list_grants(&self, account: AccountId) -> Result<Vec<Grant>, AclError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["list_grants"])
            .start_timer();

        let mut grants = Vec::new();
        for kind in CapabilityKind::ALL {
            grants.extend(self.grants_of_kind(account, kind).await?);
        }

        timer.observe_duration();
        Ok(grants)
    }

    #[instrument(skip_all, fields(account_id = %account, capability = %capability))]
    async fn insert_grant(
        &self,
        account: AccountId,
        capability: &Capability,
    ) -> Result<bool, AclError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["insert_grant"])
            .start_timer();

        let (table, column) = grant_table(capability.kind());
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (account, {}) VALUES (",
            table, column
        ));
        query.push_bind(account.0).push(", ");
        push_capability_key(&mut query, capability);
        query.push(format!(") ON CONFLICT (account, {}) DO NOTHING", column));

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(log_db_error("insert_grant"))?;

        timer.observe_duration();

        let inserted = result.rows_affected() == 1;
        if inserted {
            info!("Grant recorded");
        }
        Ok(inserted)
    }

    #[instrument(skip_all, fields(account_id = %account, capability = %capability))]
    async fn revoke_grant(
        &self,
        account: AccountId,
        capability: &Capability,
    ) -> Result<bool, AclError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["revoke_grant"])
            .start_timer();

        let (table, column) = grant_table(capability.kind());
        let mut query =
            QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE account = ", table));
        query.push_bind(account.0);
        query.push(format!(" AND {} = ", column));
        push_capability_key(&mut query, capability);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(log_db_error("revoke_grant"))?;

        timer.observe_duration();

        let revoked = result.rows_affected() > 0;
        if revoked {
            info!("Grant revoked");
        }
        Ok(revoked)
    }
}

#[async_trait]
impl InventoryStore for Database {
    #[instrument(skip_all, fields(only = ?only))]
    async fn select_deployments(
        &self,
        condition: &DeploymentCondition,
        only: Option<DeploymentId>,
    ) -> Result<Vec<Deployment>, AclError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["select_deployments"])
            .start_timer();

        let mut query = deployment_query(condition, only);
        let deployments = query
            .build_query_as::<Deployment>()
            .fetch_all(&self.pool)
            .await
            .map_err(log_db_error("select_deployments"))?;

        timer.observe_duration();
        Ok(deployments)
    }

    #[instrument(skip_all, fields(only = ?only))]
    async fn select_systems(
        &self,
        condition: &SystemCondition,
        only: Option<SystemId>,
    ) -> Result<Vec<System>, AclError> {
        let timer = STORE_QUERY_DURATION
            .with_label_values(&["select_systems"])
            .start_timer();

        let mut query = system_query(condition, only);
        let systems = query
            .build_query_as::<System>()
            .fetch_all(&self.pool)
            .await
            .map_err(log_db_error("select_systems"))?;

        timer.observe_duration();
        Ok(systems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::Condition;
    use std::collections::HashSet;

    #[test]
    fn test_unrestricted_deployments_render_true() {
        let query = deployment_query(&Condition::All, None);
        assert_eq!(
            query.sql(),
            "SELECT d.id, d.\"type\" FROM deployment d WHERE TRUE ORDER BY d.id"
        );
    }

    #[test]
    fn test_empty_grants_render_false() {
        let query = system_query(&Condition::AnyOf(Vec::new()), Some(SystemId(4)));
        assert!(query.sql().contains("WHERE FALSE AND s.id = $1 ORDER BY s.id"));
    }

    #[test]
    fn test_channels_render_as_disjunction() {
        let condition = Condition::AnyOf(vec![
            SystemClause::ManufacturerIn(HashSet::from([CustomerId(1)])),
            SystemClause::DeploymentTypeIn(HashSet::from([DeploymentType::from("LOBBY")])),
            SystemClause::OperatorIs(CustomerId(2)),
        ]);
        let query = system_query(&condition, None);
        let sql = query.sql();
        assert!(sql.contains("LEFT JOIN deployment d ON d.id = s.deployment"));
        assert!(sql.contains(
            "(s.manufacturer = ANY($1) OR d.\"type\" = ANY($2) OR s.operator = $3)"
        ));
    }

    #[test]
    fn test_group_clause_quotes_reserved_column() {
        let condition = Condition::AnyOf(vec![SystemClause::GroupIn(HashSet::from([GroupId(3)]))]);
        let query = system_query(&condition, None);
        assert!(query.sql().contains("(s.\"group\" = ANY($1))"));
    }

    #[test]
    fn test_grant_tables() {
        assert_eq!(grant_table(CapabilityKind::Type), ("type_admin", "\"type\""));
        assert_eq!(grant_table(CapabilityKind::Group), ("group_admin", "\"group\""));
        assert_eq!(
            grant_table(CapabilityKind::Manufacturer),
            ("manufacturer_admin", "manufacturer")
        );
    }
}
