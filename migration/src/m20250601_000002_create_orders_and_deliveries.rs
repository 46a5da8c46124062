use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                    .col(ColumnDef::new(Orders::ExternalId).string())
                    .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Orders::TotalAmount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Orders::Source).string().not_null())
                    .col(ColumnDef::new(Orders::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Orders::PaymentStatus).string_len(40).not_null())
                    .col(ColumnDef::new(Orders::FulfillmentStatus).string_len(20).not_null())
                    .col(ColumnDef::new(Orders::Customer).json())
                    .col(ColumnDef::new(Orders::Dropoff).json())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_orders_owner_number")
                    .table(Orders::Table)
                    .col(Orders::OwnerId)
                    .col(Orders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deliveries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deliveries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deliveries::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Deliveries::OrderId).uuid())
                    .col(ColumnDef::new(Deliveries::IntegrationId).uuid())
                    .col(ColumnDef::new(Deliveries::Provider).string().not_null())
                    .col(ColumnDef::new(Deliveries::ExternalId).string())
                    .col(ColumnDef::new(Deliveries::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Deliveries::PickupAddress).json().not_null())
                    .col(ColumnDef::new(Deliveries::PickupContact).json())
                    .col(ColumnDef::new(Deliveries::DropoffAddress).json().not_null())
                    .col(ColumnDef::new(Deliveries::DropoffContact).json())
                    .col(ColumnDef::new(Deliveries::CurrentLat).double())
                    .col(ColumnDef::new(Deliveries::CurrentLng).double())
                    .col(ColumnDef::new(Deliveries::PickupEta).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deliveries::DropoffEta).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deliveries::Fee).big_integer())
                    .col(ColumnDef::new(Deliveries::Currency).string_len(3))
                    .col(ColumnDef::new(Deliveries::TrackingUrl).text())
                    .col(ColumnDef::new(Deliveries::Metadata).json().not_null())
                    .col(
                        ColumnDef::new(Deliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Deliveries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_deliveries_provider_external")
                    .table(Deliveries::Table)
                    .col(Deliveries::Provider)
                    .col(Deliveries::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deliveries_owner_order")
                    .table(Deliveries::Table)
                    .col(Deliveries::OwnerId)
                    .col(Deliveries::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deliveries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    OwnerId,
    OrderNumber,
    ExternalId,
    Status,
    TotalAmount,
    Source,
    Currency,
    PaymentStatus,
    FulfillmentStatus,
    Customer,
    Dropoff,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Deliveries {
    Table,
    Id,
    OwnerId,
    OrderId,
    IntegrationId,
    Provider,
    ExternalId,
    Status,
    PickupAddress,
    PickupContact,
    DropoffAddress,
    DropoffContact,
    CurrentLat,
    CurrentLng,
    PickupEta,
    DropoffEta,
    Fee,
    Currency,
    TrackingUrl,
    Metadata,
    CreatedAt,
    UpdatedAt,
}
