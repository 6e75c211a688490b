// ============================================================================
// Parish Infrastructure - PostgreSQL Cash Movement Repository
// File: crates/parish-infrastructure/src/database/postgres/cash_movement_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::error;

use parish_core::domain::{ActiveTenant, BalancePeriod, MovementTotals};
use parish_core::error::DomainError;
use parish_core::repositories::CashMovementRepository;

use crate::database::registry::TenantConnectionRegistry;

pub struct PgCashMovementRepository {
    registry: Arc<TenantConnectionRegistry>,
}

impl PgCashMovementRepository {
    pub fn new(registry: Arc<TenantConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug, FromRow)]
struct TotalsRow {
    pub inflow: Decimal,
    pub outflow: Decimal,
}

impl From<TotalsRow> for MovementTotals {
    fn from(row: TotalsRow) -> Self {
        MovementTotals {
            inflow: row.inflow,
            outflow: row.outflow,
        }
    }
}

#[async_trait]
impl CashMovementRepository for PgCashMovementRepository {
    async fn totals(
        &self,
        tenant: &ActiveTenant,
        period: BalancePeriod,
    ) -> Result<MovementTotals, DomainError> {
        let mut conn = self.registry.lease_tenant(tenant).await?;

        let row: TotalsRow = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE direction = 'inflow'), 0)  AS inflow,
                COALESCE(SUM(amount) FILTER (WHERE direction = 'outflow'), 0) AS outflow
            FROM cash_movements
            WHERE occurred_on >= $1 AND occurred_on < $2
            "#,
        )
        .bind(period.first_day())
        .bind(period.end_exclusive())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error summing cash movements: {}", e);
            DomainError::PersistenceFailure(e.to_string())
        })?;

        Ok(row.into())
    }
}
