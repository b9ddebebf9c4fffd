use thiserror::Error;

/// Error type shared by crates in the workspace.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    /// Whether the error was caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::BadRequest(_) | AppError::Forbidden(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::BadRequest(anyhow::anyhow!("bad")).is_client_error());
        assert!(AppError::Forbidden(anyhow::anyhow!("no")).is_client_error());
        assert!(!AppError::DatabaseError(anyhow::anyhow!("down")).is_client_error());
        assert!(!AppError::ConfigError(anyhow::anyhow!("missing")).is_client_error());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = AppError::DatabaseError(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "Database error: connection refused");
    }
}
