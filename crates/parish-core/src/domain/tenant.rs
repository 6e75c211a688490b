// ============================================================================
// Parish Core - Tenant Entity
// File: crates/parish-core/src/domain/tenant.rs
// Description: Tenant (church) identity, database name and activation
// ============================================================================

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use parish_shared::constants::MAX_TENANT_NAME_LENGTH;

use crate::error::DomainError;

static TENANT_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("tenant name pattern is valid"));

/// Name of a tenant database.
///
/// Only ASCII letters, digits and underscores are accepted, so a value of
/// this type is always safe to place into an identifier position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantName(String);

impl TenantName {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidTenantName("tenant name is empty".into()));
        }
        if name.len() > MAX_TENANT_NAME_LENGTH {
            return Err(DomainError::InvalidTenantName(format!(
                "tenant name exceeds {} characters",
                MAX_TENANT_NAME_LENGTH
            )));
        }
        if !TENANT_NAME_PATTERN.is_match(name) {
            return Err(DomainError::InvalidTenantName(format!(
                "{:?} may only contain letters, digits and underscores",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TenantName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TenantName::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Administrative activation status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    /// Any other stored value, kept verbatim for reporting.
    Inactive(String),
}

impl TenantStatus {
    pub fn from_db(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        if normalized == "active" {
            TenantStatus::Active
        } else {
            TenantStatus::Inactive(normalized)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Inactive(raw) => raw,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TenantStatus::Active)
    }
}

/// Tenant entity, as recorded in the administrative directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub name: TenantName,
    pub display_name: String,
    pub status: TenantStatus,
}

impl Tenant {
    /// Upgrades to an [`ActiveTenant`], refusing tenants that are not active.
    pub fn into_active(self) -> Result<ActiveTenant, DomainError> {
        if self.status.is_active() {
            Ok(ActiveTenant(self))
        } else {
            Err(DomainError::TenantInactive(self.name.to_string()))
        }
    }
}

/// A tenant whose activation has been checked.
///
/// Persistence paths take this type, so an inactive tenant never reaches a
/// tenant connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveTenant(Tenant);

impl ActiveTenant {
    pub fn name(&self) -> &TenantName {
        &self.0.name
    }

    pub fn tenant(&self) -> &Tenant {
        &self.0
    }
}
