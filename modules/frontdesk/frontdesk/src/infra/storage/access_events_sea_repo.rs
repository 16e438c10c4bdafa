use async_trait::async_trait;
use frontdesk_sdk::{AccessEvent, AccessEventFilter, Page};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;
use crate::domain::repos::AccessEventsRepository;

use super::db::{db_err, scope_condition};
use super::entity::access_event;

const DEFAULT_PAGE_SIZE: u64 = 50;

/// `SeaORM`-backed access-event persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrmAccessEventsRepository;

fn filter_condition(scope: &TenantScope, filter: &AccessEventFilter) -> Condition {
    let mut cond = scope_condition(scope, access_event::Column::TenantId);
    if let Some(tenant_id) = filter.tenant_id {
        cond = cond.add(access_event::Column::TenantId.eq(tenant_id));
    }
    if let Some(unit_id) = filter.unit_id {
        cond = cond.add(access_event::Column::UnitId.eq(unit_id));
    }
    if let Some(kind) = filter.kind {
        cond = cond.add(access_event::Column::Kind.eq(kind.as_str()));
    }
    if let Some(outcome) = filter.outcome {
        cond = cond.add(access_event::Column::Outcome.eq(outcome.as_str()));
    }
    if let Some(from) = filter.created_from {
        cond = cond.add(access_event::Column::CreatedAt.gte(from));
    }
    if let Some(until) = filter.created_until {
        cond = cond.add(access_event::Column::CreatedAt.lte(until));
    }
    if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
        cond = cond.add(access_event::Column::VisitorName.contains(q));
    }
    cond
}

#[async_trait]
impl AccessEventsRepository for OrmAccessEventsRepository {
    async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        event: &AccessEvent,
    ) -> Result<(), DomainError> {
        access_event::ActiveModel::from(event)
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
    ) -> Result<Option<AccessEvent>, DomainError> {
        let row = access_event::Entity::find_by_id(id)
            .filter(scope_condition(scope, access_event::Column::TenantId))
            .one(conn)
            .await
            .map_err(db_err)?;
        row.map(AccessEvent::try_from).transpose().map_err(db_err)
    }

    async fn list<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        filter: &AccessEventFilter,
    ) -> Result<Page<AccessEvent>, DomainError> {
        let query = access_event::Entity::find().filter(filter_condition(scope, filter));

        let total = query.clone().count(conn).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(access_event::Column::CreatedAt)
            .offset(filter.offset.unwrap_or(0))
            .limit(filter.limit.unwrap_or(DEFAULT_PAGE_SIZE))
            .all(conn)
            .await
            .map_err(db_err)?;

        let items = rows
            .into_iter()
            .map(AccessEvent::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(Page { items, total })
    }

    async fn delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<bool, DomainError> {
        let res = access_event::Entity::delete_many()
            .filter(access_event::Column::Id.eq(id))
            .filter(scope_condition(scope, access_event::Column::TenantId))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }

    async fn set_remote_log_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        remote_log_id: &str,
    ) -> Result<bool, DomainError> {
        let res = access_event::Entity::update_many()
            .col_expr(
                access_event::Column::RemoteLogId,
                Expr::value(remote_log_id),
            )
            .filter(access_event::Column::Id.eq(id))
            .filter(access_event::Column::RemoteLogId.is_null())
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }
}
