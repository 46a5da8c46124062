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

use crate::domain::models::delivery::DeliveryStatus;
use crate::domain::models::event::{DomainEvent, LineItem};
use crate::domain::models::location::{Address, Contact};
use crate::domain::models::webhook::WebhookDefinition;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 服务商错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// 调用超时
    #[error("Timeout")]
    Timeout,
    /// 网络错误、5xx 或限流，可重试
    #[error("Transient failure: {0}")]
    Transient(String),
    /// 请求被拒绝（4xx 校验错误等），不可重试
    #[error("Rejected with status {status:?}: {message}")]
    Permanent {
        status: Option<u16>,
        message: String,
    },
}

impl ProviderError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::Transient(_) => true,
            ProviderError::Permanent { .. } => false,
        }
    }

    /// 根据HTTP状态码分类：5xx、408 与 429 可重试，其余 4xx 为永久错误
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        if status >= 500 || status == 408 || status == 429 {
            ProviderError::Transient(format!("status {}: {}", status, message))
        } else {
            ProviderError::Permanent {
                status: Some(status),
                message,
            }
        }
    }

    /// 对应的响应状态码（若有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Permanent { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = err.status() {
            ProviderError::from_status(status.as_u16(), err.to_string())
        } else if err.is_decode() || err.is_builder() {
            ProviderError::Permanent {
                status: None,
                message: err.to_string(),
            }
        } else {
            ProviderError::Transient(err.to_string())
        }
    }
}

/// 创建配送请求
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeliveryRequest {
    /// 所属租户ID
    pub owner_id: Uuid,
    /// 本系统订单ID，服务商用作外部引用以便去重
    pub order_id: Uuid,
    pub order_number: String,
    pub pickup_name: String,
    pub pickup_address: Address,
    pub pickup_contact: Contact,
    pub dropoff_address: Address,
    pub dropoff_contact: Contact,
    pub items: Vec<LineItem>,
    /// 订单金额（最小货币单位）
    pub order_value: i64,
    pub currency: String,
    pub notes: Option<String>,
    /// 事件幂等键，重试时保持不变
    pub idempotency_key: String,
}

/// 创建配送响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeliveryResponse {
    /// 服务商配送ID
    pub external_id: String,
    /// 初始状态
    pub status: DeliveryStatus,
    pub pickup_eta: Option<DateTime<Utc>>,
    pub dropoff_eta: Option<DateTime<Utc>>,
    /// 配送费（最小货币单位）
    pub fee: Option<i64>,
    pub currency: Option<String>,
    pub tracking_url: Option<String>,
}

/// 配送服务商能力
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// 创建配送
    async fn create_delivery(
        &self,
        request: &CreateDeliveryRequest,
    ) -> Result<CreateDeliveryResponse, ProviderError>;

    /// 服务商名称
    fn name(&self) -> &str;
}

/// 转发响应
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardResponse {
    pub status: u16,
    pub body: Option<String>,
}

/// 事件转发能力
///
/// 将规范化事件投递到目标为电商平台的 Webhook 端点。
#[async_trait]
pub trait EventForwarder: Send + Sync {
    async fn forward(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
    ) -> Result<ForwardResponse, ProviderError>;
}
