// ============================================================================
// Parish Infrastructure - PostgreSQL Obligation Repository
// File: crates/parish-infrastructure/src/database/postgres/obligation_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Connection, FromRow};
use tracing::{debug, error};

use parish_core::domain::{
    ActiveTenant, CashMovement, Obligation, ObligationDraft, ObligationKind, ObligationStatus,
};
use parish_core::error::DomainError;
use parish_core::repositories::ObligationRepository;

use crate::database::registry::TenantConnectionRegistry;

/// Obligations stored in each tenant's own database.
pub struct PgObligationRepository {
    registry: Arc<TenantConnectionRegistry>,
}

impl PgObligationRepository {
    pub fn new(registry: Arc<TenantConnectionRegistry>) -> Self {
        Self { registry }
    }
}

/// Table holding one kind of obligation.
fn table(kind: ObligationKind) -> &'static str {
    match kind {
        ObligationKind::Payable => "payables",
        ObligationKind::Receivable => "receivables",
    }
}

fn persistence_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        error!("Database error {}: {}", context, e);
        DomainError::PersistenceFailure(e.to_string())
    }
}

#[derive(Debug, FromRow)]
struct ObligationRow {
    pub id: i64,
    pub note: String,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub due_date: NaiveDate,
    pub status: String,
}

impl ObligationRow {
    fn into_obligation(self, kind: ObligationKind) -> Obligation {
        // Unknown stored values are re-derived by the service on read
        let status = ObligationStatus::from_str(&self.status).unwrap_or_else(|| {
            debug!(id = self.id, status = %self.status, "Unrecognised stored status");
            ObligationStatus::Pending
        });

        Obligation {
            id: self.id,
            kind,
            note: self.note,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            due_date: self.due_date,
            status,
        }
    }
}

#[async_trait]
impl ObligationRepository for PgObligationRepository {
    async fn list(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
    ) -> Result<Vec<Obligation>, DomainError> {
        let mut conn = self.registry.lease_tenant(tenant).await?;

        let sql = format!(
            "SELECT id, note, total_amount, amount_paid, due_date, status FROM {} ORDER BY due_date ASC, id ASC",
            table(kind)
        );
        let rows: Vec<ObligationRow> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(persistence_error("listing obligations"))?;

        Ok(rows.into_iter().map(|row| row.into_obligation(kind)).collect())
    }

    async fn find(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
    ) -> Result<Option<Obligation>, DomainError> {
        let mut conn = self.registry.lease_tenant(tenant).await?;

        let sql = format!(
            "SELECT id, note, total_amount, amount_paid, due_date, status FROM {} WHERE id = $1",
            table(kind)
        );
        let row: Option<ObligationRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(persistence_error("finding obligation"))?;

        Ok(row.map(|row| row.into_obligation(kind)))
    }

    async fn insert(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        draft: &ObligationDraft,
        status: ObligationStatus,
        movement: Option<CashMovement>,
    ) -> Result<i64, DomainError> {
        let mut conn = self.registry.lease_tenant(tenant).await?;
        let mut tx = conn
            .begin()
            .await
            .map_err(persistence_error("starting transaction"))?;

        let sql = format!(
            r#"
            INSERT INTO {} (note, total_amount, amount_paid, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
            table(kind)
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(&draft.note)
            .bind(draft.total_amount)
            .bind(draft.amount_paid)
            .bind(draft.due_date)
            .bind(status.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(persistence_error("inserting obligation"))?;

        if let Some(movement) = movement {
            sqlx::query(
                r#"
                INSERT INTO cash_movements
                    (direction, category, payment_method, amount, occurred_on, obligation_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(movement.direction.as_str())
            .bind(&movement.category)
            .bind(&movement.payment_method)
            .bind(movement.amount)
            .bind(movement.occurred_on)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(persistence_error("inserting cash movement"))?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()
            .await
            .map_err(persistence_error("committing obligation"))?;

        Ok(id)
    }

    async fn update(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
        draft: &ObligationDraft,
        status: ObligationStatus,
    ) -> Result<bool, DomainError> {
        let mut conn = self.registry.lease_tenant(tenant).await?;

        let sql = format!(
            r#"
            UPDATE {}
            SET note = $1, total_amount = $2, amount_paid = $3, due_date = $4, status = $5
            WHERE id = $6
            "#,
            table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(&draft.note)
            .bind(draft.total_amount)
            .bind(draft.amount_paid)
            .bind(draft.due_date)
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(persistence_error("updating obligation"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
    ) -> Result<bool, DomainError> {
        let mut conn = self.registry.lease_tenant(tenant).await?;

        let sql = format!("DELETE FROM {} WHERE id = $1", table(kind));
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(persistence_error("deleting obligation"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_statuses(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        changes: Vec<(i64, ObligationStatus)>,
    ) -> Result<(), DomainError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut conn = self.registry.lease_tenant(tenant).await?;

        let (ids, statuses): (Vec<i64>, Vec<String>) = changes
            .into_iter()
            .map(|(id, status)| (id, status.as_str().to_string()))
            .unzip();

        let sql = format!(
            r#"
            UPDATE {} AS o
            SET status = u.status
            FROM UNNEST($1::bigint[], $2::text[]) AS u(id, status)
            WHERE o.id = u.id
            "#,
            table(kind)
        );
        sqlx::query(&sql)
            .bind(ids)
            .bind(statuses)
            .execute(&mut *conn)
            .await
            .map_err(persistence_error("updating statuses"))?;

        Ok(())
    }
}
