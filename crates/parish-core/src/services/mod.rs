//! Domain services (business logic)

pub mod clock;
pub mod tenant_access;
pub mod obligation_service;
pub mod balance_service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use balance_service::BalanceService;
pub use obligation_service::ObligationService;
pub use tenant_access::TenantAccessService;
