// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::webhook_log::WebhookLog;
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaLogStatus;
use crate::infrastructure::database::entities::webhook_log;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// Webhook日志仓库实现
///
/// 只追加：没有更新与删除操作。
#[derive(Clone)]
pub struct WebhookLogRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl WebhookLogRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 最早的一条非重放成功日志
    fn first_success(owner_id: Uuid, idempotency_key: &str) -> Select<webhook_log::Entity> {
        webhook_log::Entity::find()
            .filter(webhook_log::Column::OwnerId.eq(owner_id))
            .filter(webhook_log::Column::IdempotencyKey.eq(idempotency_key))
            .filter(webhook_log::Column::Status.eq(SeaLogStatus::Success))
            .filter(webhook_log::Column::ReplayOf.is_null())
            .order_by_asc(webhook_log::Column::CreatedAt)
    }
}

/// 在给定连接（或事务）上追加日志
pub(super) async fn insert_log<C: ConnectionTrait>(
    conn: &C,
    log: &WebhookLog,
) -> Result<(), RepositoryError> {
    webhook_log::Entity::insert(webhook_log::ActiveModel::from(log))
        .exec(conn)
        .await
        .map_err(RepositoryError::from_insert)?;
    Ok(())
}

impl From<webhook_log::Model> for WebhookLog {
    fn from(model: webhook_log::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            webhook_id: model.webhook_id,
            idempotency_key: model.idempotency_key,
            event_type: model.event_type,
            status: model.status.into(),
            request_body: model.request_body,
            response_body: model.response_body,
            response_status: model.response_status,
            error_message: model.error_message,
            note: model.note,
            replay_of: model.replay_of,
            attempt_count: model.attempt_count,
            created_at: model.created_at.into(),
        }
    }
}

impl From<&WebhookLog> for webhook_log::ActiveModel {
    fn from(log: &WebhookLog) -> Self {
        Self {
            id: Set(log.id),
            owner_id: Set(log.owner_id),
            webhook_id: Set(log.webhook_id),
            idempotency_key: Set(log.idempotency_key.clone()),
            event_type: Set(log.event_type.clone()),
            status: Set(log.status.into()),
            request_body: Set(log.request_body.clone()),
            response_body: Set(log.response_body.clone()),
            response_status: Set(log.response_status),
            error_message: Set(log.error_message.clone()),
            note: Set(log.note.clone()),
            replay_of: Set(log.replay_of),
            attempt_count: Set(log.attempt_count),
            created_at: Set(log.created_at.into()),
        }
    }
}

#[async_trait]
impl WebhookLogRepository for WebhookLogRepoImpl {
    async fn append(&self, log: &WebhookLog) -> Result<WebhookLog, RepositoryError> {
        insert_log(self.db.as_ref(), log).await?;
        Ok(log.clone())
    }

    async fn find_success_by_key(
        &self,
        owner_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<WebhookLog>, RepositoryError> {
        let model = Self::first_success(owner_id, idempotency_key)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_success_for_webhook(
        &self,
        owner_id: Uuid,
        webhook_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<WebhookLog>, RepositoryError> {
        let model = Self::first_success(owner_id, idempotency_key)
            .filter(webhook_log::Column::WebhookId.eq(webhook_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list_by_webhook(
        &self,
        owner_id: Uuid,
        webhook_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WebhookLog>, RepositoryError> {
        let models = webhook_log::Entity::find()
            .filter(webhook_log::Column::OwnerId.eq(owner_id))
            .filter(webhook_log::Column::WebhookId.eq(webhook_id))
            .order_by_desc(webhook_log::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
