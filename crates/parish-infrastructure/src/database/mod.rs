//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod gate;
pub mod monitor;
pub mod pool;
pub mod postgres;
pub mod registry;

pub use connection::{create_pool, PgPoolFactory, PoolFactory, PoolLimits};
pub use monitor::{ConnectionMonitor, MonitorLevel, MonitorReading};
pub use pool::{PoolHandle, PoolStats, PooledConnection};
pub use postgres::{PgCashMovementRepository, PgObligationRepository, PgTenantDirectory};
pub use registry::TenantConnectionRegistry;
