// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::webhook::{
    generate_secret_key, NewWebhook, WebhookDefinition, WebhookFilter, WebhookPatch,
};
use crate::domain::models::webhook_log::WebhookLog;
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::utils::errors::RepositoryError;
use crate::utils::validators::{
    validate_endpoint_url, validate_event_types, validate_non_empty, validate_provider,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 日志查询的默认条数
pub const DEFAULT_LOG_LIMIT: u64 = 50;
/// 日志查询的最大条数
pub const MAX_LOG_LIMIT: u64 = 500;

/// 密钥碰撞时的最大重新生成次数
const SECRET_ATTEMPTS: usize = 3;

/// Webhook注册表服务
///
/// 负责Webhook定义的增删改查与校验，所有操作都限定在租户范围内。
pub struct WebhookRegistry {
    webhooks: Arc<dyn WebhookRepository>,
    logs: Arc<dyn WebhookLogRepository>,
}

impl WebhookRegistry {
    pub fn new(webhooks: Arc<dyn WebhookRepository>, logs: Arc<dyn WebhookLogRepository>) -> Self {
        Self { webhooks, logs }
    }

    /// 创建Webhook定义
    ///
    /// 校验通过后生成新的密钥并持久化；唯一约束冲突时重新生成密钥。
    pub async fn create(
        &self,
        owner_id: Uuid,
        new: NewWebhook,
    ) -> Result<WebhookDefinition, BridgeError> {
        validate_non_empty("name", &new.name)?;
        validate_provider("source_provider", &new.source_provider)?;
        validate_provider("destination_provider", &new.destination_provider)?;
        validate_endpoint_url(&new.endpoint_url)?;
        validate_event_types(&new.event_types)?;

        let mut definition = WebhookDefinition::new(owner_id, new);
        for attempt in 1..=SECRET_ATTEMPTS {
            match self.webhooks.create(&definition).await {
                Ok(created) => {
                    info!(
                        "Created webhook {} ({} {} -> {} {}) for owner {}",
                        created.id,
                        created.source_type,
                        created.source_provider,
                        created.destination_type,
                        created.destination_provider,
                        owner_id
                    );
                    return Ok(created);
                }
                Err(RepositoryError::AlreadyExists) if attempt < SECRET_ATTEMPTS => {
                    definition.id = Uuid::new_v4();
                    definition.secret_key = generate_secret_key();
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(RepositoryError::AlreadyExists.into())
    }

    /// 更新Webhook定义
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: WebhookPatch,
    ) -> Result<WebhookDefinition, BridgeError> {
        let mut definition = self.get(owner_id, id).await?;

        if patch.id.is_some_and(|new_id| new_id != definition.id) {
            return Err(BridgeError::Validation("id cannot be changed".to_string()));
        }
        if patch.owner_id.is_some_and(|new_owner| new_owner != definition.owner_id) {
            return Err(BridgeError::Validation("owner_id cannot be changed".to_string()));
        }
        if patch
            .secret_key
            .as_ref()
            .is_some_and(|secret| *secret != definition.secret_key)
        {
            return Err(BridgeError::Validation(
                "secret_key cannot be changed".to_string(),
            ));
        }

        if let Some(name) = &patch.name {
            validate_non_empty("name", name)?;
        }
        if let Some(provider) = &patch.source_provider {
            validate_provider("source_provider", provider)?;
        }
        if let Some(provider) = &patch.destination_provider {
            validate_provider("destination_provider", provider)?;
        }
        if let Some(url) = &patch.endpoint_url {
            validate_endpoint_url(url)?;
        }
        if let Some(event_types) = &patch.event_types {
            validate_event_types(event_types)?;
        }

        patch.apply_to(&mut definition);
        let updated = self.webhooks.update(&definition).await.map_err(|e| match e {
            RepositoryError::NotFound => BridgeError::NotFound(format!("webhook {}", id)),
            other => other.into(),
        })?;
        info!("Updated webhook {} for owner {}", id, owner_id);
        Ok(updated)
    }

    /// 删除Webhook定义，历史日志保留
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), BridgeError> {
        if self.webhooks.delete(owner_id, id).await? {
            info!("Deleted webhook {} for owner {}", id, owner_id);
            Ok(())
        } else {
            Err(BridgeError::NotFound(format!("webhook {}", id)))
        }
    }

    /// 获取Webhook定义
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<WebhookDefinition, BridgeError> {
        self.webhooks
            .find_by_id(owner_id, id)
            .await?
            .ok_or_else(|| BridgeError::NotFound(format!("webhook {}", id)))
    }

    /// 列出Webhook定义
    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: WebhookFilter,
    ) -> Result<Vec<WebhookDefinition>, BridgeError> {
        Ok(self.webhooks.list(owner_id, filter).await?)
    }

    /// 查询Webhook的处理日志，按时间倒序
    ///
    /// 已删除定义的日志仍可查询。
    pub async fn logs(
        &self,
        owner_id: Uuid,
        id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<WebhookLog>, BridgeError> {
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        Ok(self.logs.list_by_webhook(owner_id, id, limit).await?)
    }
}
