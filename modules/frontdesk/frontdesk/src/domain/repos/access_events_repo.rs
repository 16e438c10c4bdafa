use async_trait::async_trait;
use frontdesk_sdk::{AccessEvent, AccessEventFilter, Page};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;

/// Persistence operations for access events.
#[async_trait]
pub trait AccessEventsRepository: Send + Sync {
    async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        event: &AccessEvent,
    ) -> Result<(), DomainError>;

    async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<AccessEvent>, DomainError>;

    async fn list<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        filter: &AccessEventFilter,
    ) -> Result<Page<AccessEvent>, DomainError>;

    async fn delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<bool, DomainError>;

    /// Field-scoped write of the remote correlation key, only when unset.
    async fn set_remote_log_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        remote_log_id: &str,
    ) -> Result<bool, DomainError>;
}
