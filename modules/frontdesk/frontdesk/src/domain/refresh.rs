//! Periodic pickup-code refresh.
//!
//! An external scheduler invokes [`PickupCodeRefresher::run_once`] at a
//! fixed interval. The task re-polls the remote ticket of every package
//! whose correlation key is known and writes a changed pickup code back
//! through a field-scoped update. One item's remote error never aborts the
//! batch.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::RemoteObjectsConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::{soql_quote, RemoteDirectory};
use crate::domain::repos::{PackagesRepository, RemoteTicketRef};

const PASSWORD_FIELDS: &[&str] = &["reda__Password__c", "Password__c"];

/// Outcome of one refresh sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    pub scanned: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct PickupCodeRefresher<P> {
    db: DatabaseConnection,
    remote: Arc<dyn RemoteDirectory>,
    packages: Arc<P>,
    objects: RemoteObjectsConfig,
}

impl<P: PackagesRepository> PickupCodeRefresher<P> {
    pub fn new(
        db: DatabaseConnection,
        remote: Arc<dyn RemoteDirectory>,
        packages: Arc<P>,
        objects: RemoteObjectsConfig,
    ) -> Self {
        Self {
            db,
            remote,
            packages,
            objects,
        }
    }

    /// One sweep over all reconciled packages.
    ///
    /// # Errors
    /// Only local storage failures abort the sweep; per-item remote errors
    /// are counted in the summary and logged.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<RefreshSummary, DomainError> {
        let refs = self.packages.list_remote_ticket_refs(&self.db).await?;
        let mut summary = RefreshSummary {
            scanned: refs.len(),
            ..RefreshSummary::default()
        };

        let password_field = match self
            .remote
            .pick_field(&self.objects.ticket, PASSWORD_FIELDS)
            .await
        {
            Ok(Some(field)) => field,
            Ok(None) => {
                debug!("no pickup-code field on this org; nothing to refresh");
                return Ok(summary);
            }
            Err(e) => {
                warn!(error = %e, "could not resolve pickup-code field; skipping sweep");
                summary.failed = summary.scanned;
                return Ok(summary);
            }
        };

        for item in refs {
            match self.refresh_one(&item, &password_field).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!(package_id = %item.package_id, error = %e, "pickup-code refresh failed for item");
                }
            }
        }

        info!(
            scanned = summary.scanned,
            updated = summary.updated,
            failed = summary.failed,
            "pickup-code refresh sweep finished"
        );
        Ok(summary)
    }

    async fn refresh_one(
        &self,
        item: &RemoteTicketRef,
        password_field: &str,
    ) -> anyhow::Result<bool> {
        let soql = format!(
            "SELECT Id, {password_field} FROM {object} WHERE Id = {id} AND {password_field} != null",
            object = self.objects.ticket,
            id = soql_quote(&item.remote_ticket_id),
        );
        let records = self.remote.query(&soql).await?;
        let Some(code) = records
            .first()
            .and_then(|r| r.get(password_field))
            .and_then(Value::as_str)
        else {
            return Ok(false);
        };

        if item.pickup_code.as_deref() == Some(code) {
            return Ok(false);
        }

        self.packages
            .set_pickup_code(&self.db, item.package_id, code)
            .await?;
        Ok(true)
    }
}

impl<P> std::fmt::Debug for PickupCodeRefresher<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickupCodeRefresher")
            .field("ticket_object", &self.objects.ticket)
            .finish()
    }
}
