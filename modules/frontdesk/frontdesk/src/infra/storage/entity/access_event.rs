use frontdesk_sdk::{AccessEvent, AccessMethod, AccessOutcome, VisitorKind};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "access_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub resident_id: Option<Uuid>,
    pub visitor_name: String,
    pub visitor_document: Option<String>,
    pub visitor_phone: Option<String>,
    pub kind: String,
    pub method: String,
    pub outcome: String,
    pub denial_reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
    pub remote_log_id: Option<String>,
    pub valid_until: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AccessEvent {
    type Error = String;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            tenant_id: m.tenant_id,
            unit_id: m.unit_id,
            resident_id: m.resident_id,
            visitor_name: m.visitor_name,
            visitor_document: m.visitor_document,
            visitor_phone: m.visitor_phone,
            kind: m.kind.parse::<VisitorKind>()?,
            method: m.method.parse::<AccessMethod>()?,
            outcome: m.outcome.parse::<AccessOutcome>()?,
            denial_reason: m.denial_reason,
            created_by: m.created_by,
            created_at: m.created_at,
            remote_log_id: m.remote_log_id,
            valid_until: m.valid_until,
        })
    }
}

impl From<&AccessEvent> for ActiveModel {
    fn from(e: &AccessEvent) -> Self {
        Self {
            id: ActiveValue::Set(e.id),
            tenant_id: ActiveValue::Set(e.tenant_id),
            unit_id: ActiveValue::Set(e.unit_id),
            resident_id: ActiveValue::Set(e.resident_id),
            visitor_name: ActiveValue::Set(e.visitor_name.clone()),
            visitor_document: ActiveValue::Set(e.visitor_document.clone()),
            visitor_phone: ActiveValue::Set(e.visitor_phone.clone()),
            kind: ActiveValue::Set(e.kind.as_str().to_owned()),
            method: ActiveValue::Set(e.method.as_str().to_owned()),
            outcome: ActiveValue::Set(e.outcome.as_str().to_owned()),
            denial_reason: ActiveValue::Set(e.denial_reason.clone()),
            created_by: ActiveValue::Set(e.created_by),
            created_at: ActiveValue::Set(e.created_at),
            remote_log_id: ActiveValue::Set(e.remote_log_id.clone()),
            valid_until: ActiveValue::Set(e.valid_until),
        }
    }
}
