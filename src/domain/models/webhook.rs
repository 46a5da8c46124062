// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::event::DomainEvent;
use super::location::PickupLocation;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 密钥字节长度，编码为 64 位十六进制字符串
const SECRET_KEY_BYTES: usize = 32;

/// Webhook定义
///
/// 描述一条从来源平台（电商或配送服务商）到目标平台的事件订阅。
/// `secret_key` 在创建时生成一次，既用于认证专属入站 URL，
/// 也用于对出站转发请求签名，之后永不修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDefinition {
    /// Webhook唯一标识符
    pub id: Uuid,
    /// 所属租户ID
    pub owner_id: Uuid,
    /// 名称
    pub name: String,
    /// 描述
    pub description: Option<String>,
    /// 来源类型
    pub source_type: EndpointType,
    /// 来源服务商，例如 shopify
    pub source_provider: String,
    /// 目标类型
    pub destination_type: EndpointType,
    /// 目标服务商，例如 uber_direct
    pub destination_provider: String,
    /// 目标地址
    pub endpoint_url: String,
    /// 密钥
    pub secret_key: String,
    /// 订阅的事件类型，非空
    pub event_types: Vec<EventType>,
    /// 是否启用
    pub is_active: bool,
    /// 取货点配置，配送派单时在负载未携带取货点时使用
    pub pickup: Option<PickupLocation>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl WebhookDefinition {
    /// 根据已校验的创建参数构建新的定义，并生成密钥
    pub fn new(owner_id: Uuid, new: NewWebhook) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: new.name,
            description: new.description,
            source_type: new.source_type,
            source_provider: new.source_provider,
            destination_type: new.destination_type,
            destination_provider: new.destination_provider,
            endpoint_url: new.endpoint_url,
            secret_key: generate_secret_key(),
            event_types: new.event_types,
            is_active: new.is_active,
            pickup: new.pickup,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判断领域事件是否应分发到该定义
    ///
    /// 要求：已启用、来源类型与服务商一致、订阅了该事件类型。
    pub fn matches(&self, event: &DomainEvent) -> bool {
        self.is_active
            && self.source_type == event.source_type()
            && normalize_provider(&self.source_provider) == normalize_provider(event.source_provider())
            && self.event_types.contains(&event.event_type())
    }
}

/// 生成密码学安全的随机密钥
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; SECRET_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 规范化服务商名称：小写并去除非字母数字字符
///
/// `Uber Direct`、`uber_direct`、`uber-direct` 视为同一服务商。
pub fn normalize_provider(provider: &str) -> String {
    provider
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 端点类型
///
/// 来源与目标各自独立取值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    /// 电商平台
    Ecommerce,
    /// 配送服务商
    Delivery,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointType::Ecommerce => write!(f, "ecommerce"),
            EndpointType::Delivery => write!(f, "delivery"),
        }
    }
}

impl FromStr for EndpointType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ecommerce" => Ok(EndpointType::Ecommerce),
            "delivery" => Ok(EndpointType::Delivery),
            other => Err(format!("unknown endpoint type: {}", other)),
        }
    }
}

/// 事件类型
///
/// 系统已知的事件词汇表，Webhook 定义只能订阅其中的子集。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.updated")]
    OrderUpdated,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
    #[serde(rename = "delivery.created")]
    DeliveryCreated,
    #[serde(rename = "delivery.assigned")]
    DeliveryAssigned,
    #[serde(rename = "delivery.picked_up")]
    DeliveryPickedUp,
    #[serde(rename = "delivery.in_transit")]
    DeliveryInTransit,
    #[serde(rename = "delivery.delivered")]
    DeliveryDelivered,
    #[serde(rename = "delivery.cancelled")]
    DeliveryCancelled,
}

impl EventType {
    /// 完整词汇表
    pub const ALL: [EventType; 9] = [
        EventType::OrderCreated,
        EventType::OrderUpdated,
        EventType::OrderCancelled,
        EventType::DeliveryCreated,
        EventType::DeliveryAssigned,
        EventType::DeliveryPickedUp,
        EventType::DeliveryInTransit,
        EventType::DeliveryDelivered,
        EventType::DeliveryCancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "order.created",
            EventType::OrderUpdated => "order.updated",
            EventType::OrderCancelled => "order.cancelled",
            EventType::DeliveryCreated => "delivery.created",
            EventType::DeliveryAssigned => "delivery.assigned",
            EventType::DeliveryPickedUp => "delivery.picked_up",
            EventType::DeliveryInTransit => "delivery.in_transit",
            EventType::DeliveryDelivered => "delivery.delivered",
            EventType::DeliveryCancelled => "delivery.cancelled",
        }
    }

    /// 是否为订单类事件
    pub fn is_order_event(&self) -> bool {
        matches!(
            self,
            EventType::OrderCreated | EventType::OrderUpdated | EventType::OrderCancelled
        )
    }

    /// 是否为配送状态类事件
    pub fn is_delivery_event(&self) -> bool {
        !self.is_order_event()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // delivery.completed is accepted as an alias for delivered
            "delivery.completed" => Ok(EventType::DeliveryDelivered),
            _ => EventType::ALL
                .into_iter()
                .find(|t| t.as_str() == s)
                .ok_or_else(|| format!("unknown event type: {}", s)),
        }
    }
}

/// 创建Webhook的参数
#[derive(Debug, Clone)]
pub struct NewWebhook {
    pub name: String,
    pub description: Option<String>,
    pub source_type: EndpointType,
    pub source_provider: String,
    pub destination_type: EndpointType,
    pub destination_provider: String,
    pub endpoint_url: String,
    pub event_types: Vec<EventType>,
    pub is_active: bool,
    pub pickup: Option<PickupLocation>,
}

/// Webhook部分更新
///
/// `id`、`owner_id`、`secret_key` 仅用于识别非法修改请求，提供即被拒绝。
#[derive(Debug, Clone, Default)]
pub struct WebhookPatch {
    pub id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub secret_key: Option<String>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub source_type: Option<EndpointType>,
    pub source_provider: Option<String>,
    pub destination_type: Option<EndpointType>,
    pub destination_provider: Option<String>,
    pub endpoint_url: Option<String>,
    pub event_types: Option<Vec<EventType>>,
    pub is_active: Option<bool>,
    pub pickup: Option<Option<PickupLocation>>,
}

impl WebhookPatch {
    /// 将更新应用到定义上，不触碰标识、归属与密钥
    pub fn apply_to(self, def: &mut WebhookDefinition) {
        if let Some(name) = self.name {
            def.name = name;
        }
        if let Some(description) = self.description {
            def.description = description;
        }
        if let Some(source_type) = self.source_type {
            def.source_type = source_type;
        }
        if let Some(source_provider) = self.source_provider {
            def.source_provider = source_provider;
        }
        if let Some(destination_type) = self.destination_type {
            def.destination_type = destination_type;
        }
        if let Some(destination_provider) = self.destination_provider {
            def.destination_provider = destination_provider;
        }
        if let Some(endpoint_url) = self.endpoint_url {
            def.endpoint_url = endpoint_url;
        }
        if let Some(event_types) = self.event_types {
            def.event_types = event_types;
        }
        if let Some(is_active) = self.is_active {
            def.is_active = is_active;
        }
        if let Some(pickup) = self.pickup {
            def.pickup = pickup;
        }
        def.updated_at = Utc::now();
    }
}

/// Webhook列表过滤条件
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookFilter {
    pub source_type: Option<EndpointType>,
    pub destination_type: Option<EndpointType>,
    pub is_active: Option<bool>,
}

impl WebhookFilter {
    pub fn accepts(&self, def: &WebhookDefinition) -> bool {
        self.source_type.is_none_or_eq(def.source_type)
            && self.destination_type.is_none_or_eq(def.destination_type)
            && self.is_active.is_none_or_eq(def.is_active)
    }
}

trait OptionFilterExt<T> {
    fn is_none_or_eq(&self, value: T) -> bool;
}

impl<T: PartialEq + Copy> OptionFilterExt<T> for Option<T> {
    fn is_none_or_eq(&self, value: T) -> bool {
        self.map_or(true, |expected| expected == value)
    }
}
