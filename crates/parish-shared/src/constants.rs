//! Application-wide constants

/// Database holding the tenant directory and cross-tenant bookkeeping.
pub const DEFAULT_ADMIN_DATABASE: &str = "admin_db";
pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Zero means no caller waits for a busy pool: saturation fails fast.
pub const DEFAULT_QUEUE_LIMIT: u32 = 0;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 60;
/// PostgreSQL truncates identifiers longer than this.
pub const MAX_TENANT_NAME_LENGTH: usize = 63;
/// Money columns are NUMERIC(14, 2).
pub const MAX_AMOUNT_SCALE: u32 = 2;
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 12;
