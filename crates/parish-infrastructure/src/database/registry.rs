// ============================================================================
// Parish Infrastructure - Tenant Connection Registry
// File: crates/parish-infrastructure/src/database/registry.rs
// ============================================================================
//! One administrative pool plus one pool per tenant database, built on first
//! use and cached until closed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use sqlx::PgConnection;
use tracing::info;

use parish_core::{ActiveTenant, DomainError, TenantName};
use parish_shared::config::DatabaseSettings;
use parish_shared::utils::mask_secret;

use super::connection::{PgPoolFactory, PoolFactory};
use super::pool::{PoolHandle, PoolStats, PooledConnection};

pub struct TenantConnectionRegistry {
    factory: Arc<dyn PoolFactory>,
    admin_database: String,
    admin: RwLock<Option<PoolHandle>>,
    tenants: RwLock<HashMap<String, PoolHandle>>,
}

impl TenantConnectionRegistry {
    pub fn new(settings: DatabaseSettings) -> Self {
        info!(
            host = %settings.host,
            port = settings.port,
            user = %settings.user,
            password = mask_secret(&settings.password),
            admin_database = %settings.admin_database,
            max_connections = settings.max_connections,
            queue_limit = settings.queue_limit,
            "Connection registry configured"
        );
        let admin_database = settings.admin_database.clone();
        Self::with_factory(admin_database, Arc::new(PgPoolFactory::new(settings)))
    }

    pub fn with_factory(admin_database: impl Into<String>, factory: Arc<dyn PoolFactory>) -> Self {
        Self {
            factory,
            admin_database: admin_database.into(),
            admin: RwLock::new(None),
            tenants: RwLock::new(HashMap::new()),
        }
    }

    pub fn admin_database(&self) -> &str {
        &self.admin_database
    }

    /// The administrative pool, built on first call.
    pub fn administrative_pool(&self) -> Result<PoolHandle, DomainError> {
        if let Some(handle) = self.admin.read().as_ref() {
            return Ok(handle.clone());
        }

        let mut slot = self.admin.write();
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }
        let handle = self.build(&self.admin_database)?;
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// The pool for `tenant_name`, built on first call.
    ///
    /// The name is validated before anything else happens. Concurrent first
    /// calls for the same name build exactly one pool. Callers outside this
    /// crate go through [`lease_tenant`](Self::lease_tenant), which requires
    /// an activated tenant.
    pub(crate) fn tenant_pool(&self, tenant_name: &str) -> Result<PoolHandle, DomainError> {
        let name = TenantName::parse(tenant_name)?;
        if name.as_str() == self.admin_database {
            return Err(DomainError::InvalidTenantName(format!(
                "{} is reserved for the administrative database",
                name
            )));
        }

        if let Some(handle) = self.tenants.read().get(name.as_str()) {
            return Ok(handle.clone());
        }

        let mut tenants = self.tenants.write();
        if let Some(handle) = tenants.get(name.as_str()) {
            return Ok(handle.clone());
        }
        // A failed build leaves nothing behind, so the next call retries
        let handle = self.build(name.as_str())?;
        tenants.insert(name.as_str().to_string(), handle.clone());
        Ok(handle)
    }

    /// Longer-lived administrative lease, returned when dropped.
    pub async fn lease_administrative(&self) -> Result<PooledConnection, DomainError> {
        self.administrative_pool()?.acquire().await
    }

    /// Longer-lived tenant lease, for multi-statement work such as
    /// transactions. Returned when dropped.
    pub async fn lease_tenant(&self, tenant: &ActiveTenant) -> Result<PooledConnection, DomainError> {
        self.tenant_pool(tenant.name().as_str())?.acquire().await
    }

    /// Runs `f` on an administrative connection; the connection is back in
    /// the pool before this returns.
    pub async fn with_administrative_connection<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DomainError>>,
    {
        let mut conn = self.lease_administrative().await?;
        f(&mut conn).await
    }

    /// Runs `f` on a connection to the tenant's database; the connection is
    /// back in the pool before this returns.
    pub async fn with_tenant_connection<T, F>(&self, tenant: &ActiveTenant, f: F) -> Result<T, DomainError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DomainError>>,
    {
        let mut conn = self.lease_tenant(tenant).await?;
        f(&mut conn).await
    }

    pub async fn close_administrative_pool(&self) {
        let handle = self.admin.write().take();
        if let Some(handle) = handle {
            handle.close().await;
            info!(database = %handle.database(), "Administrative pool closed");
        }
    }

    pub async fn close_all_tenant_pools(&self) {
        let handles: Vec<PoolHandle> = self.tenants.write().drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.close().await;
            info!(database = %handle.database(), "Tenant pool closed");
        }
    }

    pub async fn close(&self) {
        self.close_all_tenant_pools().await;
        self.close_administrative_pool().await;
    }

    pub fn tenant_pool_count(&self) -> usize {
        self.tenants.read().len()
    }

    /// Occupancy of every open pool, administrative first.
    pub fn stats(&self) -> Vec<PoolStats> {
        let mut stats: Vec<PoolStats> = self.admin.read().iter().map(PoolHandle::stats).collect();
        let mut tenants: Vec<PoolStats> = self.tenants.read().values().map(PoolHandle::stats).collect();
        tenants.sort_by(|a, b| a.database.cmp(&b.database));
        stats.extend(tenants);
        stats
    }

    fn build(&self, database: &str) -> Result<PoolHandle, DomainError> {
        let pool = self.factory.build(database)?;
        let limits = self.factory.limits();
        info!(
            database = %database,
            max_connections = limits.max_connections,
            queue_limit = limits.queue_limit,
            "Connection pool created"
        );
        Ok(PoolHandle::new(database, pool, limits))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use sqlx::PgPool;

    use parish_core::{Tenant, TenantStatus};

    use super::*;
    use crate::database::connection::{tests::settings, PoolLimits};

    /// Lazily-connected pools that count how often they are built.
    struct CountingFactory {
        inner: PgPoolFactory,
        builds: AtomicUsize,
        fail_next: AtomicBool,
    }

    impl CountingFactory {
        fn new() -> Self {
            Self {
                inner: PgPoolFactory::new(settings()),
                builds: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
            }
        }

        fn builds(&self) -> usize {
            self.builds.load(Ordering::SeqCst)
        }
    }

    impl PoolFactory for CountingFactory {
        fn build(&self, database: &str) -> Result<PgPool, DomainError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(DomainError::PoolConstructionFailed {
                    database: database.to_string(),
                    reason: "host unreachable".into(),
                });
            }
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.inner.build(database)
        }

        fn limits(&self) -> PoolLimits {
            self.inner.limits()
        }
    }

    fn active(name: &str) -> ActiveTenant {
        Tenant {
            id: 1,
            name: TenantName::parse(name).unwrap(),
            display_name: name.into(),
            status: TenantStatus::Active,
        }
        .into_active()
        .unwrap()
    }

    fn registry() -> (Arc<TenantConnectionRegistry>, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory::new());
        let registry = TenantConnectionRegistry::with_factory("admin_db", factory.clone());
        (Arc::new(registry), factory)
    }

    #[tokio::test]
    async fn test_administrative_pool_is_singleton() {
        let (registry, factory) = registry();
        let first = registry.administrative_pool().unwrap();
        let second = registry.administrative_pool().unwrap();

        assert!(first.same_pool(&second));
        assert_eq!(first.database(), "admin_db");
        assert_eq!(factory.builds(), 1);
    }

    #[tokio::test]
    async fn test_tenant_pool_is_cached_per_name() {
        let (registry, factory) = registry();
        let grace = registry.tenant_pool("grace_chapel").unwrap();
        let again = registry.tenant_pool("grace_chapel").unwrap();
        let other = registry.tenant_pool("st_marks").unwrap();

        assert!(grace.same_pool(&again));
        assert!(!grace.same_pool(&other));
        assert_eq!(factory.builds(), 2);
        assert_eq!(registry.tenant_pool_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access_builds_one_pool() {
        let (registry, factory) = registry();
        let barrier = Arc::new(tokio::sync::Barrier::new(32));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    registry.tenant_pool("new_church").unwrap()
                })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(factory.builds(), 1);
        assert!(handles.windows(2).all(|pair| pair[0].same_pool(&pair[1])));
    }

    #[tokio::test]
    async fn test_invalid_names_never_reach_the_factory() {
        let (registry, factory) = registry();
        for bad in ["", "grace-chapel", "x; DROP DATABASE admin_db", "a.b"] {
            assert!(matches!(
                registry.tenant_pool(bad),
                Err(DomainError::InvalidTenantName(_))
            ));
        }
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_scoped_connection_surfaces_borrow_failure() {
        use futures::FutureExt;

        let (registry, factory) = registry();
        let result = registry
            .with_tenant_connection(&active("grace_chapel"), |_conn| async { Ok(()) }.boxed())
            .await;

        // Nothing listens on the test port, so the first borrow cannot connect
        assert!(
            matches!(result, Err(DomainError::PoolConstructionFailed { ref database, .. }) if database == "grace_chapel"),
            "unexpected result {:?}",
            result
        );
        assert_eq!(factory.builds(), 1);
        assert_eq!(registry.tenant_pool("grace_chapel").unwrap().stats().in_use, 0);
    }

    #[tokio::test]
    async fn test_admin_database_is_not_a_tenant() {
        let (registry, factory) = registry();
        assert!(matches!(
            registry.tenant_pool("admin_db"),
            Err(DomainError::InvalidTenantName(_))
        ));
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_lease_for_tenant_named_like_admin_is_refused() {
        let (registry, factory) = registry();
        assert!(matches!(
            registry.lease_tenant(&active("admin_db")).await,
            Err(DomainError::InvalidTenantName(_))
        ));
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_failed_construction_is_not_cached() {
        let (registry, factory) = registry();
        factory.fail_next.store(true, Ordering::SeqCst);

        assert!(matches!(
            registry.tenant_pool("grace_chapel"),
            Err(DomainError::PoolConstructionFailed { .. })
        ));
        assert_eq!(registry.tenant_pool_count(), 0);

        assert!(registry.tenant_pool("grace_chapel").is_ok());
        assert_eq!(factory.builds(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_rebuilds_on_demand() {
        let (registry, factory) = registry();
        let admin = registry.administrative_pool().unwrap();
        let tenant = registry.tenant_pool("grace_chapel").unwrap();

        registry.close().await;
        registry.close().await;

        assert!(admin.is_closed());
        assert!(tenant.is_closed());
        assert_eq!(registry.tenant_pool_count(), 0);
        assert!(registry.stats().is_empty());

        let rebuilt = registry.tenant_pool("grace_chapel").unwrap();
        assert!(!rebuilt.same_pool(&tenant));
        assert_eq!(factory.builds(), 3);
    }

    #[tokio::test]
    async fn test_stats_list_admin_then_tenants() {
        let (registry, _) = registry();
        registry.tenant_pool("st_marks").unwrap();
        registry.tenant_pool("grace_chapel").unwrap();
        registry.administrative_pool().unwrap();

        let names: Vec<_> = registry.stats().into_iter().map(|s| s.database).collect();
        assert_eq!(names, vec!["admin_db", "grace_chapel", "st_marks"]);
    }
}
