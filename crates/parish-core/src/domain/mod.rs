//! # Parish Core - Domain Module
//!
//! Domain entities for the Parish ledger.

pub mod tenant;
pub mod obligation;
pub mod obligation_status;
pub mod cash_balance;

// Re-export all entities and enums
pub use tenant::{ActiveTenant, Tenant, TenantName, TenantStatus};
pub use obligation::{
    CashMovement, CashMovementInput, MovementDirection, Obligation, ObligationDraft,
    ObligationInput, ObligationKind,
};
pub use obligation_status::{derive_status, ObligationStatus, StatusFilter};
pub use cash_balance::{BalancePeriod, MonthlyBalance, MovementTotals};
