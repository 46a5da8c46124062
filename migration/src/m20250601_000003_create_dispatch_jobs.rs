use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DispatchJobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DispatchJobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DispatchJobs::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(DispatchJobs::WebhookId).uuid().not_null())
                    .col(ColumnDef::new(DispatchJobs::IdempotencyKey).string_len(64).not_null())
                    .col(ColumnDef::new(DispatchJobs::Event).json().not_null())
                    .col(ColumnDef::new(DispatchJobs::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(DispatchJobs::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DispatchJobs::MaxAttempts).integer().not_null())
                    .col(ColumnDef::new(DispatchJobs::NextRetryAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(DispatchJobs::LastError).text())
                    .col(
                        ColumnDef::new(DispatchJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DispatchJobs::UpdatedAt)
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
                    .name("uq_dispatch_jobs_webhook_key")
                    .table(DispatchJobs::Table)
                    .col(DispatchJobs::WebhookId)
                    .col(DispatchJobs::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dispatch_jobs_status_next_retry")
                    .table(DispatchJobs::Table)
                    .col(DispatchJobs::Status)
                    .col(DispatchJobs::NextRetryAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DispatchJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DispatchJobs {
    Table,
    Id,
    OwnerId,
    WebhookId,
    IdempotencyKey,
    Event,
    Status,
    AttemptCount,
    MaxAttempts,
    NextRetryAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}
