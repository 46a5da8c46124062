// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::location::PickupLocation;
use crate::domain::models::webhook::{EndpointType, EventType, NewWebhook, WebhookPatch};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 创建Webhook请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateWebhookRequestDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub source_type: String,
    #[validate(length(min = 1, max = 64))]
    pub source_provider: String,
    pub destination_type: String,
    #[validate(length(min = 1, max = 64))]
    pub destination_provider: String,
    #[validate(url)]
    pub endpoint_url: String,
    #[validate(length(min = 1))]
    pub event_types: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub pickup: Option<PickupLocation>,
}

fn default_active() -> bool {
    true
}

impl TryFrom<CreateWebhookRequestDto> for NewWebhook {
    type Error = BridgeError;

    fn try_from(dto: CreateWebhookRequestDto) -> Result<Self, Self::Error> {
        Ok(NewWebhook {
            name: dto.name,
            description: dto.description,
            source_type: parse_endpoint_type("source_type", &dto.source_type)?,
            source_provider: dto.source_provider,
            destination_type: parse_endpoint_type("destination_type", &dto.destination_type)?,
            destination_provider: dto.destination_provider,
            endpoint_url: dto.endpoint_url,
            event_types: parse_event_types(&dto.event_types)?,
            is_active: dto.is_active,
            pickup: dto.pickup,
        })
    }
}

/// 更新Webhook请求
///
/// 所有字段可选。`description` 与 `pickup` 显式传 `null` 表示清空。
/// `id`、`owner_id`、`secret_key` 只允许回传原值，任何修改都会被拒绝。
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWebhookRequestDto {
    pub id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub secret_key: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub source_type: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub source_provider: Option<String>,
    pub destination_type: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub destination_provider: Option<String>,
    #[validate(url)]
    pub endpoint_url: Option<String>,
    #[validate(length(min = 1))]
    pub event_types: Option<Vec<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub pickup: Option<Option<PickupLocation>>,
}

impl TryFrom<UpdateWebhookRequestDto> for WebhookPatch {
    type Error = BridgeError;

    fn try_from(dto: UpdateWebhookRequestDto) -> Result<Self, Self::Error> {
        Ok(WebhookPatch {
            id: dto.id,
            owner_id: dto.owner_id,
            secret_key: dto.secret_key,
            name: dto.name,
            description: dto.description,
            source_type: dto
                .source_type
                .as_deref()
                .map(|s| parse_endpoint_type("source_type", s))
                .transpose()?,
            source_provider: dto.source_provider,
            destination_type: dto
                .destination_type
                .as_deref()
                .map(|s| parse_endpoint_type("destination_type", s))
                .transpose()?,
            destination_provider: dto.destination_provider,
            endpoint_url: dto.endpoint_url,
            event_types: dto.event_types.as_deref().map(parse_event_types).transpose()?,
            is_active: dto.is_active,
            pickup: dto.pickup,
        })
    }
}

/// 日志查询参数
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryDto {
    pub limit: Option<u64>,
}

/// 列表过滤参数
#[derive(Debug, Default, Deserialize)]
pub struct WebhookListQueryDto {
    pub source_type: Option<String>,
    pub destination_type: Option<String>,
    pub is_active: Option<bool>,
}

pub fn parse_endpoint_type(field: &str, value: &str) -> Result<EndpointType, BridgeError> {
    value
        .parse()
        .map_err(|e| BridgeError::Validation(format!("{}: {}", field, e)))
}

fn parse_event_types(values: &[String]) -> Result<Vec<EventType>, BridgeError> {
    values
        .iter()
        .map(|v| v.parse().map_err(BridgeError::Validation))
        .collect()
}

/// 区分“字段缺省”与“显式 null”
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
