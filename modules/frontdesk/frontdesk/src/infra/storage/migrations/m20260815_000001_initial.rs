use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tenants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tenants::Name).string().not_null())
                    .col(ColumnDef::new(Tenants::TaxId).string())
                    .col(ColumnDef::new(Tenants::RemotePropertyId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Blocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blocks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Blocks::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Blocks::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Blocks::Table, Blocks::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Units::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Units::BlockId).uuid().not_null())
                    .col(ColumnDef::new(Units::Number).string().not_null())
                    .col(ColumnDef::new(Units::Floor).string())
                    .col(ColumnDef::new(Units::RemoteUnitId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Units::Table, Units::BlockId)
                            .to(Blocks::Table, Blocks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Residents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Residents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Residents::UnitId).uuid().not_null())
                    .col(ColumnDef::new(Residents::Name).string().not_null())
                    .col(ColumnDef::new(Residents::Document).string())
                    .col(ColumnDef::new(Residents::Phone).string())
                    .col(ColumnDef::new(Residents::Active).boolean().not_null())
                    .col(ColumnDef::new(Residents::RemoteContactId).string())
                    .col(ColumnDef::new(Residents::RemoteOpportunityId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Residents::Table, Residents::UnitId)
                            .to(Units::Table, Units::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Packages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Packages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Packages::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Packages::UnitId).uuid().not_null())
                    .col(ColumnDef::new(Packages::AddresseeId).uuid().not_null())
                    .col(ColumnDef::new(Packages::Carrier).string())
                    .col(ColumnDef::new(Packages::TrackingCode).string())
                    .col(ColumnDef::new(Packages::Notes).string())
                    .col(ColumnDef::new(Packages::ReceivedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Packages::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Packages::Status).string().not_null())
                    .col(ColumnDef::new(Packages::DeliveredAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Packages::DeliveredBy).uuid())
                    .col(ColumnDef::new(Packages::RecipientName).string())
                    .col(ColumnDef::new(Packages::RemoteTicketId).string())
                    .col(ColumnDef::new(Packages::PickupCode).string())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Packages::Table, Packages::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Packages::Table, Packages::AddresseeId)
                            .to(Residents::Table, Residents::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_packages_tenant_received")
                    .table(Packages::Table)
                    .col(Packages::TenantId)
                    .col(Packages::ReceivedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_packages_remote_ticket")
                    .table(Packages::Table)
                    .col(Packages::RemoteTicketId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccessEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessEvents::TenantId).uuid().not_null())
                    .col(ColumnDef::new(AccessEvents::UnitId).uuid())
                    .col(ColumnDef::new(AccessEvents::ResidentId).uuid())
                    .col(ColumnDef::new(AccessEvents::VisitorName).string().not_null())
                    .col(ColumnDef::new(AccessEvents::VisitorDocument).string())
                    .col(ColumnDef::new(AccessEvents::VisitorPhone).string())
                    .col(ColumnDef::new(AccessEvents::Kind).string().not_null())
                    .col(ColumnDef::new(AccessEvents::Method).string().not_null())
                    .col(ColumnDef::new(AccessEvents::Outcome).string().not_null())
                    .col(ColumnDef::new(AccessEvents::DenialReason).string())
                    .col(ColumnDef::new(AccessEvents::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(AccessEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessEvents::RemoteLogId).string())
                    .col(ColumnDef::new(AccessEvents::ValidUntil).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AccessEvents::Table, AccessEvents::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_access_events_tenant_created")
                    .table(AccessEvents::Table)
                    .col(AccessEvents::TenantId)
                    .col(AccessEvents::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Packages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Residents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
    Name,
    TaxId,
    RemotePropertyId,
}

#[derive(DeriveIden)]
enum Blocks {
    Table,
    Id,
    TenantId,
    Name,
}

#[derive(DeriveIden)]
enum Units {
    Table,
    Id,
    BlockId,
    Number,
    Floor,
    RemoteUnitId,
}

#[derive(DeriveIden)]
enum Residents {
    Table,
    Id,
    UnitId,
    Name,
    Document,
    Phone,
    Active,
    RemoteContactId,
    RemoteOpportunityId,
}

#[derive(DeriveIden)]
enum Packages {
    Table,
    Id,
    TenantId,
    UnitId,
    AddresseeId,
    Carrier,
    TrackingCode,
    Notes,
    ReceivedBy,
    ReceivedAt,
    Status,
    DeliveredAt,
    DeliveredBy,
    RecipientName,
    RemoteTicketId,
    PickupCode,
}

#[derive(DeriveIden)]
enum AccessEvents {
    Table,
    Id,
    TenantId,
    UnitId,
    ResidentId,
    VisitorName,
    VisitorDocument,
    VisitorPhone,
    Kind,
    Method,
    Outcome,
    DenialReason,
    CreatedBy,
    CreatedAt,
    RemoteLogId,
    ValidUntil,
}
