// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::location::{Address, Contact, Coordinates, PickupLocation};
use super::webhook::{normalize_provider, EndpointType, EventType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 领域事件
///
/// 入站服务商通知的统一内部表示。构造后不可变：字段私有，仅通过访问器读取。
/// `idempotency_key` 由服务商名称与服务商原生事件ID确定性地推导，
/// 是重复投递去重的主要依据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    event_type: EventType,
    source_type: EndpointType,
    source_provider: String,
    native_event_id: String,
    occurred_at: DateTime<Utc>,
    payload: ProviderPayload,
    idempotency_key: String,
}

impl DomainEvent {
    /// 创建领域事件并计算幂等键
    pub fn new(
        event_type: EventType,
        source_type: EndpointType,
        source_provider: impl Into<String>,
        native_event_id: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: ProviderPayload,
    ) -> Self {
        let source_provider = source_provider.into();
        let native_event_id = native_event_id.into();
        let idempotency_key = idempotency_key(&source_provider, &native_event_id);
        Self {
            event_type,
            source_type,
            source_provider,
            native_event_id,
            occurred_at,
            payload,
            idempotency_key,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn source_type(&self) -> EndpointType {
        self.source_type
    }

    pub fn source_provider(&self) -> &str {
        &self.source_provider
    }

    pub fn native_event_id(&self) -> &str {
        &self.native_event_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &ProviderPayload {
        &self.payload
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    /// 订单负载（若有）
    pub fn order(&self) -> Option<&OrderPayload> {
        match &self.payload {
            ProviderPayload::Order(order) => Some(order),
            _ => None,
        }
    }

    /// 配送状态负载（若有）
    pub fn delivery_status(&self) -> Option<&DeliveryStatusPayload> {
        match &self.payload {
            ProviderPayload::DeliveryStatus(status) => Some(status),
            _ => None,
        }
    }
}

/// 计算幂等键：SHA-256(规范化服务商名称 ":" 原生事件ID) 的十六进制表示
pub fn idempotency_key(provider: &str, native_event_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_provider(provider).as_bytes());
    hasher.update(b":");
    hasher.update(native_event_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// 服务商负载
///
/// 已知负载形态的标签联合，外加一个不透明字节的兜底变体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderPayload {
    /// 电商订单
    Order(OrderPayload),
    /// 配送状态回调
    DeliveryStatus(DeliveryStatusPayload),
    /// 无法识别结构的原始负载
    Opaque(OpaquePayload),
}

/// 订单负载
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// 订单号，租户内唯一
    pub order_number: String,
    /// 电商平台的订单ID
    pub external_id: Option<String>,
    /// 总金额（最小货币单位）
    pub total_amount: Option<i64>,
    pub currency: Option<String>,
    pub payment_status: Option<String>,
    pub customer: Option<Contact>,
    pub dropoff: Option<Address>,
    pub pickup: Option<PickupLocation>,
    pub items: Vec<LineItem>,
    pub notes: Option<String>,
}

/// 订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    /// 单价（最小货币单位）
    pub unit_price: Option<i64>,
}

/// 配送状态负载
///
/// `provider_status` 保留服务商原始状态词汇，由状态协调器映射为内部状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStatusPayload {
    pub external_delivery_id: String,
    pub provider_status: String,
    pub courier_location: Option<Coordinates>,
    pub courier_name: Option<String>,
    pub pickup_eta: Option<DateTime<Utc>>,
    pub dropoff_eta: Option<DateTime<Utc>>,
    pub tracking_url: Option<String>,
}

/// 不透明负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaquePayload {
    pub content_type: Option<String>,
    #[serde(with = "base64_bytes")]
    pub body: Vec<u8>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
