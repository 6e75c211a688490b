//! PostgreSQL repository implementations

pub mod tenant_directory_impl;
pub mod obligation_repo_impl;
pub mod cash_movement_repo_impl;

pub use tenant_directory_impl::PgTenantDirectory;
pub use obligation_repo_impl::PgObligationRepository;
pub use cash_movement_repo_impl::PgCashMovementRepository;
