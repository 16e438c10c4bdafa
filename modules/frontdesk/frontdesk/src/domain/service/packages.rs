//! Package intake, delivery, and deletion.

use std::sync::Arc;

use chrono::Utc;
use frontdesk_sdk::{NewPackage, Package, PackageFilter, PackageStatus, Page, Principal};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::access::AccessPolicy;
use crate::domain::error::DomainError;
use crate::domain::post_commit::PostCommitQueue;
use crate::domain::reconcile::Reconciler;
use crate::domain::repos::{AccessEventsRepository, DirectoryRepository, PackagesRepository};
use crate::domain::service::month_start;

pub struct PackagesService<P, A, D> {
    db: DatabaseConnection,
    policy: AccessPolicy,
    repo: Arc<P>,
    directory: Arc<D>,
    reconciler: Arc<Reconciler<P, A>>,
}

impl<P, A, D> PackagesService<P, A, D>
where
    P: PackagesRepository + 'static,
    A: AccessEventsRepository + 'static,
    D: DirectoryRepository,
{
    pub fn new(
        db: DatabaseConnection,
        policy: AccessPolicy,
        repo: Arc<P>,
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

    /// List packages visible to the principal.
    ///
    /// When the caller supplies no filters, the current calendar month is
    /// applied as the view window and, for a principal with exactly one
    /// granted tenant, that tenant is pre-selected. Both are UX defaults;
    /// the tenant scope restriction is always part of the query.
    ///
    /// # Errors
    /// `DomainError::Database` on storage failures.
    #[instrument(skip(self, principal, filter))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &PackageFilter,
    ) -> Result<Page<Package>, DomainError> {
        let scope = self.policy.authorized_tenants(principal);

        let mut effective = filter.clone();
        if effective.is_unconstrained() {
            effective.received_from = Some(month_start(Utc::now()));
            effective.tenant_id = scope.sole_tenant();
        }

        let page = self.repo.list(&self.db, &scope, &effective).await?;
        debug!(items = page.items.len(), total = page.total, "listed packages");
        Ok(page)
    }

    /// Fetch a single package; an id owned by an unauthorized tenant is
    /// reported as not found.
    ///
    /// # Errors
    /// `DomainError::NotFound`, `DomainError::Database`.
    #[instrument(skip(self, principal), fields(package_id = %id))]
    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Package, DomainError> {
        let scope = self.policy.authorized_tenants(principal);
        self.repo
            .get(&self.db, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("package", id))
    }

    /// Register package intake. The local create is the unit of
    /// durability; remote reconciliation runs after commit and its failure
    /// is never surfaced as fatal.
    ///
    /// # Errors
    /// `DomainError::NotFound` for an unauthorized or unknown tenant/unit,
    /// `DomainError::Validation` for inconsistent input.
    #[instrument(skip(self, principal, new), fields(tenant_id = %new.tenant_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        new: NewPackage,
    ) -> Result<Package, DomainError> {
        let scope = self.policy.authorized_tenants(principal);
        if !scope.permits(new.tenant_id) {
            return Err(DomainError::not_found("tenant", new.tenant_id));
        }

        let txn = self.db.begin().await.map_err(DomainError::from)?;

        let tenant = self
            .directory
            .get_tenant(&txn, new.tenant_id)
            .await?
            .ok_or_else(|| DomainError::not_found("tenant", new.tenant_id))?;

        let (unit, unit_tenant) = self
            .directory
            .get_unit_with_tenant(&txn, new.unit_id)
            .await?
            .ok_or_else(|| DomainError::not_found("unit", new.unit_id))?;
        if unit_tenant != tenant.id {
            return Err(DomainError::not_found("unit", new.unit_id));
        }

        let addressee = self
            .directory
            .get_resident(&txn, new.addressee_id)
            .await?
            .ok_or_else(|| DomainError::not_found("resident", new.addressee_id))?;
        if addressee.unit_id != unit.id {
            return Err(DomainError::validation(
                "addressee",
                "resident does not live in the selected unit",
            ));
        }

        let package = Package {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            unit_id: unit.id,
            addressee_id: addressee.id,
            carrier: new.carrier.filter(|s| !s.is_empty()),
            tracking_code: new.tracking_code.filter(|s| !s.is_empty()),
            notes: new.notes.filter(|s| !s.is_empty()),
            received_by: principal.id,
            received_at: Utc::now(),
            status: PackageStatus::Received,
            delivered_at: None,
            delivered_by: None,
            recipient_name: None,
            remote_ticket_id: None,
            pickup_code: None,
        };
        self.repo.insert(&txn, &package).await?;

        let mut hooks = PostCommitQueue::new();
        {
            let reconciler = Arc::clone(&self.reconciler);
            let package = package.clone();
            hooks.push(
                "package remote create",
                Box::pin(async move {
                    reconciler
                        .package_created(package, tenant, Some(addressee))
                        .await
                }),
            );
        }

        txn.commit().await.map_err(DomainError::from)?;
        hooks.flush().await;

        info!(package_id = %package.id, "package received");
        Ok(package)
    }

    /// Hand the package over to a recipient. Only a `Received` package can
    /// be delivered; the remote ticket update runs after commit.
    ///
    /// # Errors
    /// `DomainError::NotFound`, `DomainError::Validation` when the package
    /// already left the `Received` state.
    #[instrument(skip(self, principal, recipient_name), fields(package_id = %id))]
    pub async fn deliver(
        &self,
        principal: &Principal,
        id: Uuid,
        recipient_name: &str,
    ) -> Result<Package, DomainError> {
        if recipient_name.trim().is_empty() {
            return Err(DomainError::validation(
                "recipient_name",
                "recipient name is required",
            ));
        }

        let scope = self.policy.authorized_tenants(principal);
        let txn = self.db.begin().await.map_err(DomainError::from)?;

        let mut package = self
            .repo
            .get(&txn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("package", id))?;
        if package.status != PackageStatus::Received {
            return Err(DomainError::validation(
                "status",
                format!("package is already {}", package.status),
            ));
        }

        let now = Utc::now();
        self.repo
            .mark_delivered(&txn, id, now, principal.id, recipient_name.trim())
            .await?;
        package.status = PackageStatus::Delivered;
        package.delivered_at = Some(now);
        package.delivered_by = Some(principal.id);
        package.recipient_name = Some(recipient_name.trim().to_owned());

        let mut hooks = PostCommitQueue::new();
        {
            let reconciler = Arc::clone(&self.reconciler);
            let package = package.clone();
            hooks.push(
                "package remote delivery update",
                Box::pin(async move { reconciler.package_delivered(package).await }),
            );
        }

        txn.commit().await.map_err(DomainError::from)?;
        hooks.flush().await;

        info!(package_id = %id, "package delivered");
        Ok(package)
    }

    /// Delete a package. When a remote ticket exists its deletion is
    /// attempted first; whether or not that succeeds, the local delete
    /// proceeds.
    ///
    /// # Errors
    /// `DomainError::NotFound`, `DomainError::Database`.
    #[instrument(skip(self, principal), fields(package_id = %id))]
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        let scope = self.policy.authorized_tenants(principal);
        let package = self
            .repo
            .get(&self.db, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("package", id))?;

        if let Some(remote_id) = package.remote_ticket_id.as_deref() {
            self.reconciler.package_deleted(remote_id).await;
        }

        let deleted = self.repo.delete(&self.db, &scope, id).await?;
        if !deleted {
            return Err(DomainError::not_found("package", id));
        }

        info!(package_id = %id, "package deleted");
        Ok(())
    }
}

impl<P, A, D> std::fmt::Debug for PackagesService<P, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagesService").finish_non_exhaustive()
    }
}
