// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookDefinition, WebhookFilter};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// Webhook定义仓库特质
///
/// 除按密钥查找外，所有方法都按租户限定范围，绝不返回其他租户的行。
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// 创建Webhook定义，密钥重复时返回 `AlreadyExists`
    async fn create(&self, webhook: &WebhookDefinition) -> Result<WebhookDefinition, RepositoryError>;
    /// 根据ID查找
    async fn find_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WebhookDefinition>, RepositoryError>;
    /// 根据密钥查找，租户由定义本身确定
    async fn find_by_secret(
        &self,
        secret_key: &str,
    ) -> Result<Option<WebhookDefinition>, RepositoryError>;
    /// 列出租户的定义
    async fn list(
        &self,
        owner_id: Uuid,
        filter: WebhookFilter,
    ) -> Result<Vec<WebhookDefinition>, RepositoryError>;
    /// 更新定义（不修改ID、租户与密钥）
    async fn update(&self, webhook: &WebhookDefinition) -> Result<WebhookDefinition, RepositoryError>;
    /// 硬删除，返回是否删除了记录
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, RepositoryError>;
}
