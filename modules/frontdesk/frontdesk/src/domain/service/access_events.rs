//! Access-event recording and lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use frontdesk_sdk::{
    AccessEvent, AccessEventFilter, AccessOutcome, NewAccessEvent, Page, Principal,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::access::AccessPolicy;
use crate::domain::error::DomainError;
use crate::domain::post_commit::PostCommitQueue;
use crate::domain::reconcile::Reconciler;
use crate::domain::repos::{AccessEventsRepository, DirectoryRepository, PackagesRepository};
use crate::domain::service::day_start;

pub struct AccessEventsService<P, A, D> {
    db: DatabaseConnection,
    policy: AccessPolicy,
    repo: Arc<A>,
    directory: Arc<D>,
    reconciler: Arc<Reconciler<P, A>>,
}

impl<P, A, D> AccessEventsService<P, A, D>
where
    P: PackagesRepository + 'static,
    A: AccessEventsRepository + 'static,
    D: DirectoryRepository,
{
    pub fn new(
        db: DatabaseConnection,
        policy: AccessPolicy,
        repo: Arc<A>,
        directory: Arc<D>,
        reconciler: Arc<Reconciler<P, A>>,
    ) -> Self {
        Self {
            db,
            policy,
            repo,
            directory,
            reconciler,
        }
    }

    /// List access events visible to the principal. With no caller filters
    /// the current day is applied as the view window, and a single-grant
    /// principal gets its tenant pre-selected.
    ///
    /// # Errors
    /// `DomainError::Database`.
    #[instrument(skip(self, principal, filter))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &AccessEventFilter,
    ) -> Result<Page<AccessEvent>, DomainError> {
        let scope = self.policy.authorized_tenants(principal);

        let mut effective = filter.clone();
        if effective.is_unconstrained() {
            effective.created_from = Some(day_start(Utc::now()));
            effective.tenant_id = scope.sole_tenant();
        }

        let page = self.repo.list(&self.db, &scope, &effective).await?;
        debug!(items = page.items.len(), total = page.total, "listed access events");
        Ok(page)
    }

    /// Fetch a single event; unauthorized ids read as not found.
    ///
    /// # Errors
    /// `DomainError::NotFound`, `DomainError::Database`.
    #[instrument(skip(self, principal), fields(event_id = %id))]
    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<AccessEvent, DomainError> {
        let scope = self.policy.authorized_tenants(principal);
        self.repo
            .get(&self.db, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("access event", id))
    }

    /// Record a check-in attempt.
    ///
    /// When the visitor's phone and the responsible party's remote
    /// opportunity key are both known, an unexpired remote pre-approval
    /// upgrades the event to `Permitted` and stamps its expiry. The lookup
    /// is best-effort; any failure means the caller-supplied outcome
    /// stands.
    ///
    /// # Errors
    /// `DomainError::NotFound` for an unauthorized or unknown tenant/unit/
    /// resident, `DomainError::Validation` for inconsistent input.
    #[instrument(skip(self, principal, new), fields(tenant_id = %new.tenant_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        new: NewAccessEvent,
    ) -> Result<AccessEvent, DomainError> {
        if new.visitor_name.trim().is_empty() {
            return Err(DomainError::validation(
                "visitor_name",
                "visitor name is required",
            ));
        }

        let scope = self.policy.authorized_tenants(principal);
        if !scope.permits(new.tenant_id) {
            return Err(DomainError::not_found("tenant", new.tenant_id));
        }

        let tenant = self
            .directory
            .get_tenant(&self.db, new.tenant_id)
            .await?
            .ok_or_else(|| DomainError::not_found("tenant", new.tenant_id))?;

        if let Some(unit_id) = new.unit_id {
            let (_, unit_tenant) = self
                .directory
                .get_unit_with_tenant(&self.db, unit_id)
                .await?
                .ok_or_else(|| DomainError::not_found("unit", unit_id))?;
            if unit_tenant != tenant.id {
                return Err(DomainError::not_found("unit", unit_id));
            }
        }

        let responsible = match new.resident_id {
            Some(resident_id) => {
                let resident = self
                    .directory
                    .get_resident(&self.db, resident_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("resident", resident_id))?;
                let resident_tenant = self
                    .directory
                    .get_unit_with_tenant(&self.db, resident.unit_id)
                    .await?
                    .map(|(_, tenant_id)| tenant_id);
                if resident_tenant != Some(tenant.id) {
                    return Err(DomainError::not_found("resident", resident_id));
                }
                Some(resident)
            }
            None => None,
        };

        // Pre-approval short-circuit: a read against the remote system
        // before any local state changes.
        let mut outcome = new.outcome;
        let mut valid_until = None;
        if let (Some(phone), Some(opportunity_id)) = (
            new.visitor_phone.as_deref().filter(|p| !p.is_empty()),
            responsible
                .as_ref()
                .and_then(|r| r.remote_opportunity_id.as_deref()),
        ) {
            if let Some(expiry) = self
                .reconciler
                .check_preapproval(phone, opportunity_id)
                .await
            {
                debug!(%expiry, "unexpired pre-approval found; event is permitted");
                outcome = AccessOutcome::Permitted;
                valid_until = Some(expiry);
            }
        }

        let event = AccessEvent {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            unit_id: new.unit_id,
            resident_id: new.resident_id,
            visitor_name: new.visitor_name.trim().to_owned(),
            visitor_document: new.visitor_document.filter(|s| !s.is_empty()),
            visitor_phone: new.visitor_phone.filter(|s| !s.is_empty()),
            kind: new.kind,
            method: new.method,
            outcome,
            denial_reason: new.denial_reason.filter(|s| !s.is_empty()),
            created_by: principal.id,
            created_at: Utc::now(),
            remote_log_id: None,
            valid_until,
        };

        let txn = self.db.begin().await.map_err(DomainError::from)?;
        self.repo.insert(&txn, &event).await?;

        let mut hooks = PostCommitQueue::new();
        {
            let reconciler = Arc::clone(&self.reconciler);
            let event = event.clone();
            hooks.push(
                "access event remote create",
                Box::pin(async move {
                    reconciler
                        .access_event_created(event, tenant, responsible)
                        .await
                }),
            );
        }

        txn.commit().await.map_err(DomainError::from)?;
        hooks.flush().await;

        info!(event_id = %event.id, outcome = %event.outcome.as_str(), "access event recorded");
        Ok(event)
    }

    /// Delete an access event, attempting the remote visitor-log delete
    /// first. Remote failure never blocks the local delete.
    ///
    /// # Errors
    /// `DomainError::NotFound`, `DomainError::Database`.
    #[instrument(skip(self, principal), fields(event_id = %id))]
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        let scope = self.policy.authorized_tenants(principal);
        let event = self
            .repo
            .get(&self.db, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("access event", id))?;

        if let Some(remote_id) = event.remote_log_id.as_deref() {
            self.reconciler.access_event_deleted(remote_id).await;
        }

        let deleted = self.repo.delete(&self.db, &scope, id).await?;
        if !deleted {
            return Err(DomainError::not_found("access event", id));
        }

        info!(event_id = %id, "access event deleted");
        Ok(())
    }

    /// Direct pre-approval lookup, exposed for check-in screens.
    pub async fn check_preapproval(
        &self,
        phone: &str,
        opportunity_id: &str,
    ) -> Option<DateTime<Utc>> {
        self.reconciler.check_preapproval(phone, opportunity_id).await
    }
}

impl<P, A, D> std::fmt::Debug for AccessEventsService<P, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEventsService").finish_non_exhaustive()
    }
}
