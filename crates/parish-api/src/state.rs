use std::sync::Arc;

use parish_core::repositories::{CashMovementRepository, ObligationRepository, TenantDirectory};
use parish_core::services::{BalanceService, ObligationService, TenantAccessService};
use parish_infrastructure::TenantConnectionRegistry;
use parish_shared::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TenantConnectionRegistry>,
    pub tenants: Arc<TenantAccessService<dyn TenantDirectory>>,
    pub obligations: Arc<ObligationService<dyn ObligationRepository>>,
    pub balances: Arc<BalanceService<dyn CashMovementRepository>>,
    pub config: AppConfig,
}
