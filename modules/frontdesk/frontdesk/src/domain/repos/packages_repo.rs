use async_trait::async_trait;
use chrono::{DateTime, Utc};
use frontdesk_sdk::{Package, PackageFilter, Page};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;

/// A package's remote correlation state, as needed by the pickup-code
/// refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTicketRef {
    pub package_id: Uuid,
    pub remote_ticket_id: String,
    pub pickup_code: Option<String>,
}

/// Persistence operations for packages.
#[async_trait]
pub trait PackagesRepository: Send + Sync {
    async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        package: &Package,
    ) -> Result<(), DomainError>;

    /// Find by id conjoined with the tenant scope.
    async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Package>, DomainError>;

    /// List within the scope; filter fields are conjunctive additions.
    async fn list<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        filter: &PackageFilter,
    ) -> Result<Page<Package>, DomainError>;

    /// Record delivery fields on a package row.
    async fn mark_delivered<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        delivered_at: DateTime<Utc>,
        delivered_by: Uuid,
        recipient_name: &str,
    ) -> Result<(), DomainError>;

    /// Delete by id conjoined with the scope; `false` when nothing matched.
    async fn delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<bool, DomainError>;

    /// Field-scoped write of the remote correlation key, only when it is
    /// still unset. Returns `false` when the key was already present, which
    /// lets a double-invoked reconciliation detect the earlier create.
    async fn set_remote_ticket_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        remote_ticket_id: &str,
        pickup_code: Option<&str>,
    ) -> Result<bool, DomainError>;

    /// Field-scoped write of the cached pickup code.
    async fn set_pickup_code<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        pickup_code: &str,
    ) -> Result<(), DomainError>;

    /// All packages whose remote ticket id is known, for the periodic
    /// refresh task.
    async fn list_remote_ticket_refs<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<Vec<RemoteTicketRef>, DomainError>;
}
