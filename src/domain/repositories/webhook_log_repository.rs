// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook_log::WebhookLog;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// Webhook日志仓库特质
///
/// 只追加：没有更新与删除操作。
#[async_trait]
pub trait WebhookLogRepository: Send + Sync {
    /// 追加日志
    async fn append(&self, log: &WebhookLog) -> Result<WebhookLog, RepositoryError>;
    /// 查找幂等键下最早的成功日志
    async fn find_success_by_key(
        &self,
        owner_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<WebhookLog>, RepositoryError>;
    /// 查找某个Webhook在幂等键下最早的成功日志
    async fn find_success_for_webhook(
        &self,
        owner_id: Uuid,
        webhook_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<WebhookLog>, RepositoryError>;
    /// 按时间倒序列出某个Webhook的日志
    async fn list_by_webhook(
        &self,
        owner_id: Uuid,
        webhook_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WebhookLog>, RepositoryError>;
}
