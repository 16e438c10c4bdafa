use async_trait::async_trait;
use frontdesk_sdk::{Resident, Tenant, Unit};
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;
use crate::domain::repos::DirectoryRepository;

use super::db::{db_err, scope_condition};
use super::entity::{block, resident, tenant, unit};

/// `SeaORM`-backed read access to the tenancy tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrmDirectoryRepository;

#[async_trait]
impl DirectoryRepository for OrmDirectoryRepository {
    async fn list_tenants<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
    ) -> Result<Vec<Tenant>, DomainError> {
        let rows = tenant::Entity::find()
            .filter(scope_condition(scope, tenant::Column::Id))
            .order_by_asc(tenant::Column::Name)
            .all(conn)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn get_tenant<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<Tenant>, DomainError> {
        let row = tenant::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(db_err)?;
        Ok(row.map(Tenant::from))
    }

    async fn get_unit_with_tenant<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<(Unit, Uuid)>, DomainError> {
        let Some((unit_row, block_row)) = unit::Entity::find_by_id(id)
            .find_also_related(block::Entity)
            .one(conn)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let block_row =
            block_row.ok_or_else(|| db_err(format!("unit {id} has no owning block")))?;
        Ok(Some((Unit::from(unit_row), block_row.tenant_id)))
    }

    async fn get_resident<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<Resident>, DomainError> {
        let row = resident::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(db_err)?;
        Ok(row.map(Resident::from))
    }
}
