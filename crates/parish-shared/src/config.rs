//! Configuration management

use std::fmt;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::*;
use crate::error::AppError;
use crate::utils::mask_secret;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

/// Connection parameters shared by the administrative pool and every tenant
/// pool. Only the database name differs between pools.
#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub admin_database: String,
    pub max_connections: u32,
    pub queue_limit: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// `None` when set to zero, which leaves the server default in place.
    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_secs > 0).then(|| Duration::from_secs(self.statement_timeout_secs))
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &mask_secret(&self.password))
            .field("admin_database", &self.admin_database)
            .field("max_connections", &self.max_connections)
            .field("queue_limit", &self.queue_limit)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("statement_timeout_secs", &self.statement_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Server-wide client connection count above which a warning is logged.
    /// Zero falls back to `database.max_connections`.
    pub max_active_connections: u32,
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "parish-server")?
            .set_default("database.host", DEFAULT_DB_HOST)?
            .set_default("database.port", DEFAULT_DB_PORT as i64)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "")?
            .set_default("database.admin_database", DEFAULT_ADMIN_DATABASE)?
            .set_default("database.max_connections", DEFAULT_MAX_CONNECTIONS as i64)?
            .set_default("database.queue_limit", DEFAULT_QUEUE_LIMIT as i64)?
            .set_default("database.acquire_timeout_secs", DEFAULT_ACQUIRE_TIMEOUT_SECS as i64)?
            .set_default("database.statement_timeout_secs", DEFAULT_STATEMENT_TIMEOUT_SECS as i64)?
            .set_default("monitor.enabled", true)?
            .set_default("monitor.interval_secs", DEFAULT_MONITOR_INTERVAL_SECS as i64)?
            .set_default("monitor.max_active_connections", 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> AppConfig {
        AppConfig::with_defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_pool_defaults() {
        let config = defaults();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.queue_limit, 0);
        assert_eq!(config.database.acquire_timeout(), Duration::from_secs(10));
        assert_eq!(config.database.admin_database, "admin_db");
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config: AppConfig = AppConfig::with_defaults(Config::builder())
            .unwrap()
            .set_override("database.max_connections", 25)
            .unwrap()
            .set_override("database.statement_timeout_secs", 0)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 25);
        assert!(config.database.statement_timeout().is_none());
    }

    #[test]
    fn test_debug_masks_password() {
        let mut config = defaults();
        config.database.password = "s3cret".into();
        let rendered = format!("{:?}", config.database);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("********"));
    }
}
