use frontdesk_sdk::{Package, PackageStatus};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "packages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
    pub addressee_id: Uuid,
    pub carrier: Option<String>,
    pub tracking_code: Option<String>,
    pub notes: Option<String>,
    pub received_by: Uuid,
    pub received_at: DateTimeUtc,
    pub status: String,
    pub delivered_at: Option<DateTimeUtc>,
    pub delivered_by: Option<Uuid>,
    pub recipient_name: Option<String>,
    pub remote_ticket_id: Option<String>,
    pub pickup_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::AddresseeId",
        to = "super::resident::Column::Id"
    )]
    Resident,
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Package {
    type Error = String;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            tenant_id: m.tenant_id,
            unit_id: m.unit_id,
            addressee_id: m.addressee_id,
            carrier: m.carrier,
            tracking_code: m.tracking_code,
            notes: m.notes,
            received_by: m.received_by,
            received_at: m.received_at,
            status: m.status.parse::<PackageStatus>()?,
            delivered_at: m.delivered_at,
            delivered_by: m.delivered_by,
            recipient_name: m.recipient_name,
            remote_ticket_id: m.remote_ticket_id,
            pickup_code: m.pickup_code,
        })
    }
}

impl From<&Package> for ActiveModel {
    fn from(p: &Package) -> Self {
        Self {
            id: ActiveValue::Set(p.id),
            tenant_id: ActiveValue::Set(p.tenant_id),
            unit_id: ActiveValue::Set(p.unit_id),
            addressee_id: ActiveValue::Set(p.addressee_id),
            carrier: ActiveValue::Set(p.carrier.clone()),
            tracking_code: ActiveValue::Set(p.tracking_code.clone()),
            notes: ActiveValue::Set(p.notes.clone()),
            received_by: ActiveValue::Set(p.received_by),
            received_at: ActiveValue::Set(p.received_at),
            status: ActiveValue::Set(p.status.as_str().to_owned()),
            delivered_at: ActiveValue::Set(p.delivered_at),
            delivered_by: ActiveValue::Set(p.delivered_by),
            recipient_name: ActiveValue::Set(p.recipient_name.clone()),
            remote_ticket_id: ActiveValue::Set(p.remote_ticket_id.clone()),
            pickup_code: ActiveValue::Set(p.pickup_code.clone()),
        }
    }
}
