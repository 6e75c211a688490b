//! Obligation repository trait (port)

use async_trait::async_trait;

use crate::domain::{
    ActiveTenant, CashMovement, Obligation, ObligationDraft, ObligationKind, ObligationStatus,
};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObligationRepository: Send + Sync {
    /// All obligations of one kind, ordered by due date ascending.
    async fn list(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
    ) -> Result<Vec<Obligation>, DomainError>;

    async fn find(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
    ) -> Result<Option<Obligation>, DomainError>;

    /// Inserts the obligation and, when given, its cash movement atomically.
    /// Returns the new obligation id.
    async fn insert(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        draft: &ObligationDraft,
        status: ObligationStatus,
        movement: Option<CashMovement>,
    ) -> Result<i64, DomainError>;

    /// Returns `false` when no row has the given id.
    async fn update(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
        draft: &ObligationDraft,
        status: ObligationStatus,
    ) -> Result<bool, DomainError>;

    /// Returns `false` when no row has the given id.
    async fn delete(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
    ) -> Result<bool, DomainError>;

    async fn update_statuses(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        changes: Vec<(i64, ObligationStatus)>,
    ) -> Result<(), DomainError>;
}
