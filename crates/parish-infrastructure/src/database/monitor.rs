//! Periodic check of server-wide client connections
//!
//! Counts client backends in `pg_stat_activity` over the administrative pool
//! and warns once the count exceeds the configured ceiling.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use parish_core::DomainError;
use parish_shared::config::MonitorSettings;

use super::registry::TenantConnectionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorLevel {
    Normal,
    OverLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorReading {
    pub active: i64,
    pub limit: i64,
    pub level: MonitorLevel,
}

pub struct ConnectionMonitor {
    registry: Arc<TenantConnectionRegistry>,
    interval: Duration,
    limit: i64,
}

impl ConnectionMonitor {
    /// `fallback_limit` applies when the settings leave the ceiling unset.
    pub fn new(registry: Arc<TenantConnectionRegistry>, settings: &MonitorSettings, fallback_limit: u32) -> Self {
        let limit = if settings.max_active_connections == 0 {
            fallback_limit
        } else {
            settings.max_active_connections
        };
        Self {
            registry,
            interval: settings.interval(),
            limit: i64::from(limit),
        }
    }

    pub fn assess(active: i64, limit: i64) -> MonitorReading {
        let level = if active > limit {
            MonitorLevel::OverLimit
        } else {
            MonitorLevel::Normal
        };
        MonitorReading { active, limit, level }
    }

    pub async fn check_once(&self) -> Result<MonitorReading, DomainError> {
        let active = self
            .registry
            .with_administrative_connection(|conn| {
                async move {
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*) FROM pg_stat_activity WHERE backend_type = 'client backend'",
                    )
                    .fetch_one(conn)
                    .await
                    .map_err(|e| {
                        error!("Database error counting active connections: {}", e);
                        DomainError::PersistenceFailure(e.to_string())
                    })
                }
                .boxed()
            })
            .await?;

        let reading = Self::assess(active, self.limit);
        match reading.level {
            MonitorLevel::OverLimit => warn!(
                active = reading.active,
                limit = reading.limit,
                "Active connections exceeded the configured limit"
            ),
            MonitorLevel::Normal => debug!(active = reading.active, limit = reading.limit, "Connection check"),
        }
        Ok(reading)
    }

    /// Runs [`check_once`](Self::check_once) every interval until `shutdown`
    /// flips to `true` or its sender is dropped. Failed checks are logged and
    /// the loop keeps going.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), limit = self.limit, "Connection monitor started");
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.check_once().await {
                            warn!("Connection check failed: {}", e);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Connection monitor stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::tests::settings;

    fn monitor_settings(max_active_connections: u32) -> MonitorSettings {
        MonitorSettings {
            enabled: true,
            interval_secs: 60,
            max_active_connections,
        }
    }

    #[test]
    fn test_assess_below_limit() {
        let reading = ConnectionMonitor::assess(4, 10);
        assert_eq!(reading.level, MonitorLevel::Normal);
        assert_eq!(reading.active, 4);
    }

    #[test]
    fn test_assess_at_limit_is_normal() {
        assert_eq!(ConnectionMonitor::assess(10, 10).level, MonitorLevel::Normal);
    }

    #[test]
    fn test_assess_over_limit() {
        assert_eq!(ConnectionMonitor::assess(11, 10).level, MonitorLevel::OverLimit);
    }

    #[tokio::test]
    async fn test_limit_falls_back_when_unset() {
        let registry = Arc::new(TenantConnectionRegistry::new(settings()));
        let monitor = ConnectionMonitor::new(registry.clone(), &monitor_settings(0), 3);
        assert_eq!(monitor.limit, 3);

        let monitor = ConnectionMonitor::new(registry, &monitor_settings(80), 3);
        assert_eq!(monitor.limit, 80);
    }

    #[tokio::test]
    async fn test_check_reports_unreachable_server() {
        let registry = Arc::new(TenantConnectionRegistry::new(settings()));
        let monitor = ConnectionMonitor::new(registry, &monitor_settings(0), 3);
        assert!(monitor.check_once().await.is_err());
    }

    #[tokio::test]
    async fn test_spawned_monitor_stops_on_shutdown() {
        let registry = Arc::new(TenantConnectionRegistry::new(settings()));
        let monitor = ConnectionMonitor::new(registry, &monitor_settings(0), 3);
        let (tx, rx) = watch::channel(false);

        let task = monitor.spawn(rx);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
