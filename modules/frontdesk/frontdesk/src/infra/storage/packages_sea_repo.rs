use async_trait::async_trait;
use chrono::{DateTime, Utc};
use frontdesk_sdk::{Package, PackageFilter, PackageStatus, Page};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;
use crate::domain::repos::{PackagesRepository, RemoteTicketRef};

use super::db::{db_err, scope_condition};
use super::entity::{package, resident};

const DEFAULT_PAGE_SIZE: u64 = 50;

/// `SeaORM`-backed package persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrmPackagesRepository;

fn filter_condition(scope: &TenantScope, filter: &PackageFilter) -> Condition {
    let mut cond = scope_condition(scope, package::Column::TenantId);
    if let Some(tenant_id) = filter.tenant_id {
        cond = cond.add(package::Column::TenantId.eq(tenant_id));
    }
    if let Some(unit_id) = filter.unit_id {
        cond = cond.add(package::Column::UnitId.eq(unit_id));
    }
    if let Some(status) = filter.status {
        cond = cond.add(package::Column::Status.eq(status.as_str()));
    }
    if let Some(from) = filter.received_from {
        cond = cond.add(package::Column::ReceivedAt.gte(from));
    }
    if let Some(until) = filter.received_until {
        cond = cond.add(package::Column::ReceivedAt.lte(until));
    }
    cond
}

#[async_trait]
impl PackagesRepository for OrmPackagesRepository {
    async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        package: &Package,
    ) -> Result<(), DomainError> {
        package::ActiveModel::from(package)
            .insert(conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Package>, DomainError> {
        let row = package::Entity::find_by_id(id)
            .filter(scope_condition(scope, package::Column::TenantId))
            .one(conn)
            .await
            .map_err(db_err)?;
        row.map(Package::try_from).transpose().map_err(db_err)
    }

    async fn list<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        filter: &PackageFilter,
    ) -> Result<Page<Package>, DomainError> {
        let mut query = package::Entity::find().filter(filter_condition(scope, filter));

        if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
            query = query
                .join(JoinType::LeftJoin, package::Relation::Resident.def())
                .filter(
                    Condition::any()
                        .add(package::Column::TrackingCode.contains(q))
                        .add(resident::Column::Name.contains(q)),
                );
        }

        let total = query.clone().count(conn).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(package::Column::ReceivedAt)
            .offset(filter.offset.unwrap_or(0))
            .limit(filter.limit.unwrap_or(DEFAULT_PAGE_SIZE))
            .all(conn)
            .await
            .map_err(db_err)?;

        let items = rows
            .into_iter()
            .map(Package::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(Page { items, total })
    }

    async fn mark_delivered<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        delivered_at: DateTime<Utc>,
        delivered_by: Uuid,
        recipient_name: &str,
    ) -> Result<(), DomainError> {
        package::Entity::update_many()
            .col_expr(
                package::Column::Status,
                Expr::value(PackageStatus::Delivered.as_str()),
            )
            .col_expr(package::Column::DeliveredAt, Expr::value(delivered_at))
            .col_expr(package::Column::DeliveredBy, Expr::value(delivered_by))
            .col_expr(package::Column::RecipientName, Expr::value(recipient_name))
            .filter(package::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<bool, DomainError> {
        let res = package::Entity::delete_many()
            .filter(package::Column::Id.eq(id))
            .filter(scope_condition(scope, package::Column::TenantId))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }

    async fn set_remote_ticket_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        remote_ticket_id: &str,
        pickup_code: Option<&str>,
    ) -> Result<bool, DomainError> {
        let mut update = package::Entity::update_many().col_expr(
            package::Column::RemoteTicketId,
            Expr::value(remote_ticket_id),
        );
        if let Some(code) = pickup_code {
            update = update.col_expr(package::Column::PickupCode, Expr::value(code));
        }
        // Conditional on the key still being unset: a second reconciliation
        // of the same row affects zero rows instead of overwriting.
        let res = update
            .filter(package::Column::Id.eq(id))
            .filter(package::Column::RemoteTicketId.is_null())
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }

    async fn set_pickup_code<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        pickup_code: &str,
    ) -> Result<(), DomainError> {
        package::Entity::update_many()
            .col_expr(package::Column::PickupCode, Expr::value(pickup_code))
            .filter(package::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_remote_ticket_refs<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<Vec<RemoteTicketRef>, DomainError> {
        let rows = package::Entity::find()
            .filter(package::Column::RemoteTicketId.is_not_null())
            .order_by_desc(package::Column::ReceivedAt)
            .all(conn)
            .await
            .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .filter_map(|m| {
                m.remote_ticket_id.map(|remote_ticket_id| RemoteTicketRef {
                    package_id: m.id,
                    remote_ticket_id,
                    pickup_code: m.pickup_code,
                })
            })
            .collect())
    }
}
