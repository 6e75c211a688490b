//! Cash movement repository trait (port)

use async_trait::async_trait;

use crate::domain::{ActiveTenant, BalancePeriod, MovementTotals};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CashMovementRepository: Send + Sync {
    /// Summed inflows and outflows dated within `period`. Zero when none.
    async fn totals(
        &self,
        tenant: &ActiveTenant,
        period: BalancePeriod,
    ) -> Result<MovementTotals, DomainError>;
}
