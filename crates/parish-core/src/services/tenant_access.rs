// ============================================================================
// Parish Core - Tenant Access Service
// File: crates/parish-core/src/services/tenant_access.rs
// ============================================================================
//! Resolves a request's tenant and enforces activation before any tenant
//! connection is handed out.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{ActiveTenant, Tenant, TenantName};
use crate::error::DomainError;
use crate::repositories::TenantDirectory;

pub struct TenantAccessService<D: TenantDirectory + ?Sized> {
    directory: Arc<D>,
}

impl<D: TenantDirectory + ?Sized> TenantAccessService<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Looks up a tenant by verification key without the activation check.
    pub async fn lookup_by_key(&self, key: &str) -> Result<Tenant, DomainError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DomainError::TenantNotFound);
        }

        self.directory
            .find_by_verification_key(key)
            .await?
            .ok_or_else(|| {
                warn!("Tenant lookup failed: unknown verification key");
                DomainError::TenantNotFound
            })
    }

    pub async fn resolve_by_key(&self, key: &str) -> Result<ActiveTenant, DomainError> {
        let tenant = self.lookup_by_key(key).await?;
        activate(tenant)
    }

    pub async fn resolve_by_name(&self, name: &str) -> Result<ActiveTenant, DomainError> {
        let name = TenantName::parse(name)?;
        let tenant = self
            .directory
            .find_by_name(&name)
            .await?
            .ok_or(DomainError::TenantNotFound)?;
        activate(tenant)
    }

    /// Resolves by key and checks that the key belongs to `claimed_name`.
    pub async fn resolve_claimed(
        &self,
        key: &str,
        claimed_name: &str,
    ) -> Result<ActiveTenant, DomainError> {
        let claimed = TenantName::parse(claimed_name)?;
        let tenant = self.resolve_by_key(key).await?;
        if tenant.name() != &claimed {
            warn!(claimed = %claimed, "Verification key belongs to a different tenant");
            return Err(DomainError::TenantMismatch(claimed.to_string()));
        }
        Ok(tenant)
    }
}

fn activate(tenant: Tenant) -> Result<ActiveTenant, DomainError> {
    let name = tenant.name.clone();
    match tenant.into_active() {
        Ok(active) => {
            info!(tenant = %name, "Tenant resolved");
            Ok(active)
        }
        Err(e) => {
            warn!(tenant = %name, "Tenant blocked: not active");
            Err(e)
        }
    }
}
