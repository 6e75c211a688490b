//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Tenant not found")]
    TenantNotFound,

    #[error("Tenant not active: {0}")]
    TenantInactive(String),

    #[error("Tenant does not match the verification key: {0}")]
    TenantMismatch(String),

    #[error("Invalid tenant name: {0}")]
    InvalidTenantName(String),

    #[error("Connection pool exhausted for database {database}")]
    PoolExhausted { database: String },

    #[error("Connection pool closed for database {database}")]
    PoolClosed { database: String },

    #[error("Connection pool for database {database} could not be built: {reason}")]
    PoolConstructionFailed { database: String, reason: String },

    #[error("Invalid obligation data: {0}")]
    InvalidObligationData(String),

    #[error("Invalid balance period: {0}")]
    InvalidPeriod(String),

    #[error("Obligation not found: {0}")]
    ObligationNotFound(i64),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl DomainError {
    /// Conditions a caller may retry with its own backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::PoolExhausted { .. } | DomainError::PoolConstructionFailed { .. }
        )
    }
}
