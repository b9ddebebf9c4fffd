use std::sync::Arc;

use service_core::error::AppError;

use crate::acl::AccessControl;
use crate::config::AclConfig;
use crate::services::{init_metrics, Database};

/// Connect to the hardware database, create the grant tables and wire up an
/// [`AccessControl`] with the configured system policy.
pub async fn build(config: &AclConfig) -> Result<AccessControl, AppError> {
    init_metrics();

    let db = Database::connect(&config.database).await.map_err(|e| {
        tracing::error!("Failed to connect to PostgreSQL: {}", e);
        e
    })?;
    db.run_migrations().await.map_err(|e| {
        tracing::error!("Failed to run grant table migrations: {}", e);
        e
    })?;

    let policy = config.system_policy();
    tracing::info!(
        service = %config.service_name,
        channels = ?policy.channels(),
        "Access control ready"
    );

    Ok(AccessControl::new(Arc::new(db), policy))
}
