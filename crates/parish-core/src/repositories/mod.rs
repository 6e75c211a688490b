//! Repository traits (ports)

pub mod tenant_directory;
pub mod obligation_repository;
pub mod cash_movement_repository;

pub use tenant_directory::TenantDirectory;
pub use obligation_repository::ObligationRepository;
pub use cash_movement_repository::CashMovementRepository;

#[cfg(test)]
pub use obligation_repository::MockObligationRepository;
#[cfg(test)]
pub use tenant_directory::MockTenantDirectory;
#[cfg(test)]
pub use cash_movement_repository::MockCashMovementRepository;
