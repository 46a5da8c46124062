// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::event::DomainEvent;
use super::webhook::WebhookDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Webhook日志
///
/// 每一次处理尝试的只追加审计记录。重试新增行而不修改旧行，保留完整历史。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    /// 日志唯一标识符
    pub id: Uuid,
    /// 所属租户ID
    pub owner_id: Uuid,
    /// 所属Webhook定义ID
    pub webhook_id: Uuid,
    /// 事件幂等键
    pub idempotency_key: Option<String>,
    /// 事件类型
    pub event_type: Option<String>,
    /// 日志状态
    pub status: LogStatus,
    /// 请求体
    pub request_body: Option<String>,
    /// 响应体
    pub response_body: Option<String>,
    /// 响应状态码
    pub response_status: Option<i32>,
    /// 错误信息
    pub error_message: Option<String>,
    /// 说明，例如“幂等重放”或“无订阅”
    pub note: Option<String>,
    /// 重放所对应的原始成功日志
    pub replay_of: Option<Uuid>,
    /// 尝试次数（从 1 开始）
    pub attempt_count: i32,
    /// 记录时间
    pub created_at: DateTime<Utc>,
}

impl WebhookLog {
    /// 创建一条日志
    pub fn new(owner_id: Uuid, webhook_id: Uuid, status: LogStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            webhook_id,
            idempotency_key: None,
            event_type: None,
            status,
            request_body: None,
            response_body: None,
            response_status: None,
            error_message: None,
            note: None,
            replay_of: None,
            attempt_count: 1,
            created_at: Utc::now(),
        }
    }

    pub fn success(owner_id: Uuid, webhook_id: Uuid) -> Self {
        Self::new(owner_id, webhook_id, LogStatus::Success)
    }

    pub fn failed(owner_id: Uuid, webhook_id: Uuid, error: impl Into<String>) -> Self {
        let mut log = Self::new(owner_id, webhook_id, LogStatus::Failed);
        log.error_message = Some(error.into());
        log
    }

    /// 为某个定义处理某个事件创建日志
    pub fn for_event(webhook: &WebhookDefinition, event: &DomainEvent, status: LogStatus) -> Self {
        Self::new(webhook.owner_id, webhook.id, status)
            .with_event(event.idempotency_key(), event.event_type())
    }

    pub fn with_event(mut self, idempotency_key: &str, event_type: impl fmt::Display) -> Self {
        self.idempotency_key = Some(idempotency_key.to_string());
        self.event_type = Some(event_type.to_string());
        self
    }

    pub fn with_request(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// 请求体无法序列化时保留原值
    pub fn with_request_body(mut self, body: Option<String>) -> Self {
        if body.is_some() {
            self.request_body = body;
        }
        self
    }

    pub fn with_response(mut self, status: Option<i32>, body: Option<String>) -> Self {
        self.response_status = status;
        self.response_body = body;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt_count = attempt as i32;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.status = LogStatus::Failed;
        self.error_message = Some(error.into());
        self
    }

    /// 是否为幂等重放记录
    pub fn is_replay(&self) -> bool {
        self.replay_of.is_some()
    }
}

/// 日志状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// 待处理
    #[default]
    Pending,
    /// 成功
    Success,
    /// 失败
    Failed,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStatus::Pending => write!(f, "pending"),
            LogStatus::Success => write!(f, "success"),
            LogStatus::Failed => write!(f, "failed"),
        }
    }
}
