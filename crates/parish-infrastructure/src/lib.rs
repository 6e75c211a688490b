//! # Parish Infrastructure
//!
//! Connection registry and PostgreSQL adapters.

pub mod database;

pub use database::{
    ConnectionMonitor, PgCashMovementRepository, PgObligationRepository, PgTenantDirectory,
    PoolHandle, PoolStats, TenantConnectionRegistry,
};
