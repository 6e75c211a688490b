//! Tenant directory trait (port)
//!
//! Resolves tenants from the administrative database. Credentials are not
//! checked here; the verification key only selects a tenant.

use async_trait::async_trait;

use crate::domain::{Tenant, TenantName};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_verification_key(&self, key: &str) -> Result<Option<Tenant>, DomainError>;
    async fn find_by_name(&self, name: &TenantName) -> Result<Option<Tenant>, DomainError>;
}
