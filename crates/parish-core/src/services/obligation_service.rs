// ============================================================================
// Parish Core - Obligation Service
// File: crates/parish-core/src/services/obligation_service.rs
// ============================================================================
//! Reads and writes obligations, deriving every status through
//! [`derive_status`](crate::domain::derive_status) on the way in and out.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    ActiveTenant, CashMovementInput, Obligation, ObligationInput, ObligationKind, StatusFilter,
};
use crate::error::DomainError;
use crate::repositories::ObligationRepository;
use crate::services::clock::Clock;

pub struct ObligationService<R: ObligationRepository + ?Sized> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: ObligationRepository + ?Sized> ObligationService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Lists obligations with statuses re-derived for today.
    ///
    /// Statuses that moved since they were stored are written back before the
    /// filter is applied, so a stale stored value never decides membership.
    pub async fn list(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        filter: StatusFilter,
    ) -> Result<Vec<Obligation>, DomainError> {
        let today = self.clock.today();
        let mut obligations = self.repo.list(tenant, kind).await?;

        let mut changes = Vec::new();
        for obligation in obligations.iter_mut() {
            let changed = obligation.refresh_status(today).map_err(|e| {
                warn!(id = obligation.id, tenant = %tenant.name(), "Stored obligation is malformed: {}", e);
                e
            })?;
            if changed {
                changes.push((obligation.id, obligation.status));
            }
        }

        if !changes.is_empty() {
            debug!(tenant = %tenant.name(), count = changes.len(), "Persisting refreshed statuses");
            self.repo.update_statuses(tenant, kind, changes).await?;
        }

        obligations.retain(|o| filter.matches(o.status));
        obligations.sort_by_key(|o| (o.due_date, o.id));
        Ok(obligations)
    }

    pub async fn get(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
    ) -> Result<Obligation, DomainError> {
        let mut obligation = self
            .repo
            .find(tenant, kind, id)
            .await?
            .ok_or(DomainError::ObligationNotFound(id))?;

        if obligation.refresh_status(self.clock.today())? {
            self.repo
                .update_statuses(tenant, kind, vec![(obligation.id, obligation.status)])
                .await?;
        }
        Ok(obligation)
    }

    /// Registers a new obligation, optionally with the payment already made.
    pub async fn register(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        input: &ObligationInput,
        movement: Option<&CashMovementInput>,
    ) -> Result<Obligation, DomainError> {
        let draft = input.parse()?;
        let status = draft.status_on(self.clock.today())?;
        let movement = movement
            .map(|m| m.parse(kind, draft.amount_paid))
            .transpose()?;

        let id = self.repo.insert(tenant, kind, &draft, status, movement).await?;
        info!(tenant = %tenant.name(), kind = kind.as_str(), id, status = status.as_str(), "Obligation registered");

        Ok(draft.into_obligation(id, kind, status))
    }

    /// Replaces the editable fields and recomputes the status.
    pub async fn update(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
        input: &ObligationInput,
    ) -> Result<Obligation, DomainError> {
        let draft = input.parse()?;
        let status = draft.status_on(self.clock.today())?;

        if !self.repo.update(tenant, kind, id, &draft, status).await? {
            return Err(DomainError::ObligationNotFound(id));
        }
        info!(tenant = %tenant.name(), kind = kind.as_str(), id, status = status.as_str(), "Obligation updated");

        Ok(draft.into_obligation(id, kind, status))
    }

    pub async fn delete(
        &self,
        tenant: &ActiveTenant,
        kind: ObligationKind,
        id: i64,
    ) -> Result<(), DomainError> {
        if !self.repo.delete(tenant, kind, id).await? {
            return Err(DomainError::ObligationNotFound(id));
        }
        info!(tenant = %tenant.name(), kind = kind.as_str(), id, "Obligation deleted");
        Ok(())
    }
}
