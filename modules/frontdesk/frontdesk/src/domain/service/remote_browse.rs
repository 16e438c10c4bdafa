//! Read-through listings of remote tickets and visitor logs.
//!
//! These browse the remote system directly rather than local rows, so the
//! tenant scope is enforced by resolving the property filter first: a
//! scoped principal whose tenants carry no remote mapping sees nothing,
//! never everything.

use std::sync::Arc;

use frontdesk_sdk::{Principal, RemoteBrowseFilter};
use sea_orm::DatabaseConnection;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::RemoteObjectsConfig;
use crate::domain::access::{AccessPolicy, TenantScope};
use crate::domain::error::DomainError;
use crate::domain::ports::{soql_datetime, soql_quote, RemoteDirectory, RemoteRecord};
use crate::domain::repos::DirectoryRepository;

const TICKET_FIELDS: &[&str] = &[
    "Id",
    "Name",
    "CreatedDate",
    "LastModifiedDate",
    "reda__Status__c",
    "reda__Property__c",
    "reda__Package_Name__c",
    "reda__Package_For__c",
];

const LOG_PROPERTY_FIELDS: &[&str] = &["reda__Property__c", "Property__c"];
const LOG_GUEST_FIELDS: &[&str] = &["reda__Guest_Name__c", "Visitor_Name__c"];
const LOG_ACCESS_FIELDS: &[&str] = &["reda__Access_Type__c", "Access_Type__c"];
const LOG_RESULT_FIELDS: &[&str] = &["reda__Result__c", "Result__c", "Access_Result__c"];

const MAX_LIMIT: u32 = 500;

pub struct RemoteBrowseService<D> {
    db: DatabaseConnection,
    policy: AccessPolicy,
    directory: Arc<D>,
    remote: Arc<dyn RemoteDirectory>,
    objects: RemoteObjectsConfig,
}

impl<D: DirectoryRepository> RemoteBrowseService<D> {
    pub fn new(
        db: DatabaseConnection,
        policy: AccessPolicy,
        directory: Arc<D>,
        remote: Arc<dyn RemoteDirectory>,
        objects: RemoteObjectsConfig,
    ) -> Self {
        Self {
            db,
            policy,
            directory,
            remote,
            objects,
        }
    }

    /// List remote tickets for the caller's resolved property.
    ///
    /// # Errors
    /// `DomainError::NotFound` for an unauthorized tenant choice;
    /// `DomainError::Internal` when the remote query fails (browsing has no
    /// local fallback, unlike reconciliation).
    #[instrument(skip(self, principal, filter))]
    pub async fn list_remote_tickets(
        &self,
        principal: &Principal,
        filter: &RemoteBrowseFilter,
    ) -> Result<Vec<RemoteRecord>, DomainError> {
        let Some(property) = self.resolve_property(principal, filter.tenant_id).await? else {
            return Ok(Vec::new());
        };

        let mut clauses = vec!["reda__Status__c IN ('Handed Over', 'Received')".to_owned()];
        if let Some(property_id) = property {
            clauses.push(format!("reda__Property__c = {}", soql_quote(&property_id)));
        }
        if let Some(from) = filter.created_from {
            clauses.push(format!("CreatedDate >= {}", soql_datetime(from)));
        }
        if let Some(until) = filter.created_until {
            clauses.push(format!("CreatedDate <= {}", soql_datetime(until)));
        }
        if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
            let like = soql_quote(&format!("%{q}%"));
            clauses.push(format!(
                "(Name LIKE {like} OR reda__Package_For__c LIKE {like})"
            ));
        }

        let soql = format!(
            "SELECT {fields} FROM {object} WHERE {clauses} ORDER BY CreatedDate DESC LIMIT {limit}",
            fields = TICKET_FIELDS.join(", "),
            object = self.objects.ticket,
            clauses = clauses.join(" AND "),
            limit = filter.limit.unwrap_or(MAX_LIMIT).min(MAX_LIMIT),
        );
        let records = self.remote.query(&soql).await.map_err(browse_err)?;
        debug!(count = records.len(), "fetched remote tickets");
        Ok(records)
    }

    /// List remote visitor logs. Optional fields are discovered through
    /// `pick_field` so the listing degrades gracefully on orgs that lack
    /// them.
    ///
    /// # Errors
    /// As for [`Self::list_remote_tickets`].
    #[instrument(skip(self, principal, filter))]
    pub async fn list_remote_visitor_logs(
        &self,
        principal: &Principal,
        filter: &RemoteBrowseFilter,
    ) -> Result<Vec<RemoteRecord>, DomainError> {
        let Some(property) = self.resolve_property(principal, filter.tenant_id).await? else {
            return Ok(Vec::new());
        };

        let object = &self.objects.visitor_log;
        let fld_property = self
            .remote
            .pick_field(object, LOG_PROPERTY_FIELDS)
            .await
            .map_err(browse_err)?;
        let fld_guest = self
            .remote
            .pick_field(object, LOG_GUEST_FIELDS)
            .await
            .map_err(browse_err)?;
        let fld_access = self
            .remote
            .pick_field(object, LOG_ACCESS_FIELDS)
            .await
            .map_err(browse_err)?;
        let fld_result = self
            .remote
            .pick_field(object, LOG_RESULT_FIELDS)
            .await
            .map_err(browse_err)?;

        let mut fields = vec!["Id".to_owned(), "Name".to_owned(), "CreatedDate".to_owned()];
        for f in [&fld_property, &fld_guest, &fld_access, &fld_result]
            .into_iter()
            .flatten()
        {
            fields.push(f.clone());
        }

        let mut clauses = Vec::new();
        match (property, &fld_property) {
            (Some(property_id), Some(field)) => {
                clauses.push(format!("{field} = {}", soql_quote(&property_id)));
            }
            (Some(_), None) => {
                // The org cannot express a property filter; returning
                // everything would leak other properties' logs.
                warn!("visitor log object has no property field; returning nothing");
                return Ok(Vec::new());
            }
            (None, _) => {}
        }
        if let Some(from) = filter.created_from {
            clauses.push(format!("CreatedDate >= {}", soql_datetime(from)));
        }
        if let Some(until) = filter.created_until {
            clauses.push(format!("CreatedDate <= {}", soql_datetime(until)));
        }
        if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
            let like = soql_quote(&format!("%{q}%"));
            let mut terms = vec![format!("Name LIKE {like}")];
            if let Some(guest) = &fld_guest {
                terms.push(format!("{guest} LIKE {like}"));
            }
            clauses.push(format!("({})", terms.join(" OR ")));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let soql = format!(
            "SELECT {fields} FROM {object}{where_clause} ORDER BY CreatedDate DESC LIMIT {limit}",
            fields = fields.join(", "),
            limit = filter.limit.unwrap_or(MAX_LIMIT).min(MAX_LIMIT),
        );
        let records = self.remote.query(&soql).await.map_err(browse_err)?;
        debug!(count = records.len(), "fetched remote visitor logs");
        Ok(records)
    }

    /// Resolve the property filter for a browse request.
    ///
    /// Outer `None` means "show nothing"; `Some(None)` means a privileged
    /// principal browsing without a property restriction.
    async fn resolve_property(
        &self,
        principal: &Principal,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<Option<String>>, DomainError> {
        let scope = self.policy.authorized_tenants(principal);

        let chosen = match tenant_id {
            Some(id) => {
                if !scope.permits(id) {
                    return Err(DomainError::not_found("tenant", id));
                }
                Some(id)
            }
            None => scope.sole_tenant(),
        };

        match chosen {
            Some(id) => {
                let tenant = self
                    .directory
                    .get_tenant(&self.db, id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("tenant", id))?;
                match tenant.remote_property_id {
                    Some(property_id) => Ok(Some(Some(property_id))),
                    // Unmapped tenant: nothing of theirs exists remotely.
                    None => Ok(None),
                }
            }
            None => {
                if matches!(scope, TenantScope::All) {
                    Ok(Some(None))
                } else {
                    // A scoped principal with zero or many grants must pick
                    // a tenant; browsing unfiltered would cross tenants.
                    Ok(None)
                }
            }
        }
    }
}

fn browse_err(e: crate::domain::ports::RemoteError) -> DomainError {
    DomainError::Internal(anyhow::Error::new(e).context("remote browse query"))
}

impl<D> std::fmt::Debug for RemoteBrowseService<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBrowseService").finish_non_exhaustive()
    }
}
