use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Webhooks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Webhooks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Webhooks::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Webhooks::Name).string().not_null())
                    .col(ColumnDef::new(Webhooks::Description).text())
                    .col(ColumnDef::new(Webhooks::SourceType).string_len(20).not_null())
                    .col(ColumnDef::new(Webhooks::SourceProvider).string().not_null())
                    .col(ColumnDef::new(Webhooks::DestinationType).string_len(20).not_null())
                    .col(ColumnDef::new(Webhooks::DestinationProvider).string().not_null())
                    .col(ColumnDef::new(Webhooks::EndpointUrl).text().not_null())
                    .col(
                        ColumnDef::new(Webhooks::SecretKey)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Webhooks::EventTypes).json().not_null())
                    .col(ColumnDef::new(Webhooks::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Webhooks::Pickup).json())
                    .col(
                        ColumnDef::new(Webhooks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Webhooks::UpdatedAt)
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
                    .name("idx_webhooks_owner_active")
                    .table(Webhooks::Table)
                    .col(Webhooks::OwnerId)
                    .col(Webhooks::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebhookLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WebhookLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(WebhookLogs::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(WebhookLogs::WebhookId).uuid().not_null())
                    .col(ColumnDef::new(WebhookLogs::IdempotencyKey).string_len(64))
                    .col(ColumnDef::new(WebhookLogs::EventType).string_len(40))
                    .col(ColumnDef::new(WebhookLogs::Status).string_len(20).not_null())
                    .col(ColumnDef::new(WebhookLogs::RequestBody).text())
                    .col(ColumnDef::new(WebhookLogs::ResponseBody).text())
                    .col(ColumnDef::new(WebhookLogs::ResponseStatus).integer())
                    .col(ColumnDef::new(WebhookLogs::ErrorMessage).text())
                    .col(ColumnDef::new(WebhookLogs::Note).text())
                    .col(ColumnDef::new(WebhookLogs::ReplayOf).uuid())
                    .col(
                        ColumnDef::new(WebhookLogs::AttemptCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(WebhookLogs::CreatedAt)
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
                    .name("idx_webhook_logs_owner_key_status")
                    .table(WebhookLogs::Table)
                    .col(WebhookLogs::OwnerId)
                    .col(WebhookLogs::IdempotencyKey)
                    .col(WebhookLogs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_logs_webhook_created")
                    .table(WebhookLogs::Table)
                    .col(WebhookLogs::WebhookId)
                    .col(WebhookLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Webhooks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Webhooks {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    SourceType,
    SourceProvider,
    DestinationType,
    DestinationProvider,
    EndpointUrl,
    SecretKey,
    EventTypes,
    IsActive,
    Pickup,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WebhookLogs {
    Table,
    Id,
    OwnerId,
    WebhookId,
    IdempotencyKey,
    EventType,
    Status,
    RequestBody,
    ResponseBody,
    ResponseStatus,
    ErrorMessage,
    Note,
    ReplayOf,
    AttemptCount,
    CreatedAt,
}
