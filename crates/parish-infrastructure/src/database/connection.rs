//! Database connection pool construction
//!
//! Pools are built lazily: no connection is opened until the first borrow.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use parish_core::DomainError;
use parish_shared::config::DatabaseSettings;

const APPLICATION_NAME: &str = "parish";

/// Capacity knobs applied to every pool the registry builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_connections: u32,
    /// Callers allowed to wait for a busy pool. Zero fails fast.
    pub queue_limit: u32,
    pub acquire_timeout: Duration,
}

impl PoolLimits {
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self {
            max_connections: settings.max_connections,
            queue_limit: settings.queue_limit,
            acquire_timeout: settings.acquire_timeout(),
        }
    }
}

/// Connect options for one database, sharing host and credentials.
pub fn connect_options(settings: &DatabaseSettings, database: &str) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(database)
        .application_name(APPLICATION_NAME);

    // Abandoned statements are cancelled server-side
    match settings.statement_timeout() {
        Some(timeout) => options.options([("statement_timeout", timeout.as_millis().to_string())]),
        None => options,
    }
}

pub fn create_pool(settings: &DatabaseSettings, database: &str) -> Result<PgPool, DomainError> {
    let limits = PoolLimits::from_settings(settings);
    if limits.max_connections == 0 {
        return Err(DomainError::PoolConstructionFailed {
            database: database.to_string(),
            reason: "max_connections must be at least 1".into(),
        });
    }

    Ok(PgPoolOptions::new()
        .max_connections(limits.max_connections)
        .min_connections(0)
        .acquire_timeout(limits.acquire_timeout)
        .connect_lazy_with(connect_options(settings, database)))
}

/// Builds the pool behind a registry entry.
pub trait PoolFactory: Send + Sync {
    fn build(&self, database: &str) -> Result<PgPool, DomainError>;
    fn limits(&self) -> PoolLimits;
}

pub struct PgPoolFactory {
    settings: DatabaseSettings,
}

impl PgPoolFactory {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }
}

impl PoolFactory for PgPoolFactory {
    fn build(&self, database: &str) -> Result<PgPool, DomainError> {
        create_pool(&self.settings, database)
    }

    fn limits(&self) -> PoolLimits {
        PoolLimits::from_settings(&self.settings)
    }
}
