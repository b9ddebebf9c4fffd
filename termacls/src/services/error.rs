use service_core::error::AppError;
use thiserror::Error;

/// Errors raised while evaluating an authorization decision.
///
/// "Not administerable" is never an error; it is an `Ok(false)` or an
/// entity missing from a listing. Any `Err` must be treated as deny.
#[derive(Error, Debug)]
pub enum AclError {
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<AclError> for AppError {
    fn from(err: AclError) -> Self {
        match err {
            AclError::InvalidAccount(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            AclError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            AclError::Migration(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            AclError::Store(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
            AclError::Config(e) => AppError::ConfigError(anyhow::anyhow!(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_account_maps_to_bad_request() {
        let err: AppError = AclError::InvalidAccount("account id must be positive".into()).into();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_store_failures_map_to_database_error() {
        let err: AppError = AclError::Store("lock poisoned".into()).into();
        assert!(matches!(err, AppError::DatabaseError(_)));

        let err: AppError = AclError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_config_maps_to_config_error() {
        let err: AppError = AclError::Config("no system channels".into()).into();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
