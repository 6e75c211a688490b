// ============================================================================
// Parish Infrastructure - PostgreSQL Tenant Directory
// File: crates/parish-infrastructure/src/database/postgres/tenant_directory_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{error, warn};

use parish_core::domain::{Tenant, TenantName, TenantStatus};
use parish_core::error::DomainError;
use parish_core::repositories::TenantDirectory;

use crate::database::registry::TenantConnectionRegistry;

/// Tenant lookups against the administrative database.
pub struct PgTenantDirectory {
    registry: Arc<TenantConnectionRegistry>,
}

impl PgTenantDirectory {
    pub fn new(registry: Arc<TenantConnectionRegistry>) -> Self {
        Self { registry }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct TenantRow {
    pub id: i64,
    pub database_name: String,
    pub display_name: String,
    pub status: String,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = DomainError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let name = TenantName::parse(&row.database_name).map_err(|e| {
            warn!(id = row.id, "Tenant row carries an unusable database name: {}", e);
            e
        })?;

        Ok(Tenant {
            id: row.id,
            name,
            display_name: row.display_name,
            status: TenantStatus::from_db(&row.status),
        })
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_by_verification_key(&self, key: &str) -> Result<Option<Tenant>, DomainError> {
        let mut conn = self.registry.lease_administrative().await?;

        let row: Option<TenantRow> = sqlx::query_as(
            r#"
            SELECT id, database_name, display_name, status
            FROM tenants
            WHERE verification_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding tenant by verification key: {}", e);
            DomainError::PersistenceFailure(e.to_string())
        })?;

        row.map(Tenant::try_from).transpose()
    }

    async fn find_by_name(&self, name: &TenantName) -> Result<Option<Tenant>, DomainError> {
        let mut conn = self.registry.lease_administrative().await?;

        let row: Option<TenantRow> = sqlx::query_as(
            r#"
            SELECT id, database_name, display_name, status
            FROM tenants
            WHERE database_name = $1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding tenant by name: {}", e);
            DomainError::PersistenceFailure(e.to_string())
        })?;

        row.map(Tenant::try_from).transpose()
    }
}
