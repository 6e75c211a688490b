// ============================================================================
// Parish Core - Balance Service
// File: crates/parish-core/src/services/balance_service.rs
// ============================================================================
//! Monthly inflow/outflow summary over a tenant's cash movements.

use std::sync::Arc;
use tracing::debug;

use crate::domain::{ActiveTenant, BalancePeriod, MonthlyBalance};
use crate::error::DomainError;
use crate::repositories::CashMovementRepository;
use crate::services::clock::Clock;

pub struct BalanceService<R: CashMovementRepository + ?Sized> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: CashMovementRepository + ?Sized> BalanceService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Balance for the given month. A missing year or month is taken from
    /// today's date.
    pub async fn monthly_balance(
        &self,
        tenant: &ActiveTenant,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<MonthlyBalance, DomainError> {
        let current = BalancePeriod::containing(self.clock.today())?;
        let period = BalancePeriod::new(
            year.unwrap_or(current.year()),
            month.unwrap_or(current.month()),
        )?;

        let totals = self.repo.totals(tenant, period).await?;
        debug!(
            tenant = %tenant.name(),
            year = period.year(),
            month = period.month(),
            "Monthly balance computed"
        );
        Ok(MonthlyBalance::new(period, totals))
    }
}
