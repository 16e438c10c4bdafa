use async_trait::async_trait;
use frontdesk_sdk::{Resident, Tenant, Unit};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;

/// Read access to the tenancy tree (tenants, units, residents).
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// List tenants visible to the scope, ordered by name.
    async fn list_tenants<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
    ) -> Result<Vec<Tenant>, DomainError>;

    /// Find a tenant by id. Unscoped: tenant rows themselves are not
    /// secrets, only their resources are.
    async fn get_tenant<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<Tenant>, DomainError>;

    /// Find a unit together with its owning tenant id (through the block).
    async fn get_unit_with_tenant<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<(Unit, Uuid)>, DomainError>;

    /// Find a resident by id.
    async fn get_resident<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<Resident>, DomainError>;
}
