// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::event::OrderPayload;
use super::location::{Address, Contact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 订单实体
///
/// 在 `order.created` 摄取时创建。状态只由派单器、状态协调器与订单摄取推进，
/// 仪表盘不直接修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// 订单唯一标识符
    pub id: Uuid,
    /// 所属租户ID
    pub owner_id: Uuid,
    /// 订单号，租户内唯一
    pub order_number: String,
    /// 电商平台订单ID
    pub external_id: Option<String>,
    /// 订单状态
    pub status: OrderStatus,
    /// 总金额（最小货币单位）
    pub total_amount: i64,
    /// 订单来源服务商
    pub source: String,
    pub currency: String,
    /// 支付状态，保留来源平台词汇
    pub payment_status: String,
    /// 履约状态
    pub fulfillment_status: FulfillmentStatus,
    /// 顾客联系人快照
    pub customer: Option<Contact>,
    /// 送达地址快照
    pub dropoff: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 由订单负载构建新订单
    pub fn from_payload(owner_id: Uuid, source: &str, payload: &OrderPayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            order_number: payload.order_number.clone(),
            external_id: payload.external_id.clone(),
            status: OrderStatus::Pending,
            total_amount: payload.total_amount.unwrap_or(0),
            source: source.to_string(),
            currency: payload
                .currency
                .clone()
                .unwrap_or_else(|| "USD".to_string()),
            payment_status: payload
                .payment_status
                .clone()
                .unwrap_or_else(|| "pending".to_string()),
            fulfillment_status: FulfillmentStatus::Unfulfilled,
            customer: payload.customer.clone(),
            dropoff: payload.dropoff.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 用较新的负载刷新可变字段，未提供的字段保持不变
    pub fn refresh_from(&mut self, payload: &OrderPayload) {
        if let Some(total) = payload.total_amount {
            self.total_amount = total;
        }
        if let Some(currency) = &payload.currency {
            self.currency = currency.clone();
        }
        if let Some(payment_status) = &payload.payment_status {
            self.payment_status = payment_status.clone();
        }
        if payload.customer.is_some() {
            self.customer = payload.customer.clone();
        }
        if payload.dropoff.is_some() {
            self.dropoff = payload.dropoff.clone();
        }
        if self.external_id.is_none() {
            self.external_id = payload.external_id.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// 待处理
    #[default]
    Pending,
    /// 已确认（已派单）
    Confirmed,
    /// 配送中
    OutForDelivery,
    /// 已送达
    Delivered,
    /// 已取消
    Cancelled,
}

impl OrderStatus {
    /// 已送达或已取消的订单不再变化
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::OutForDelivery => write!(f, "out_for_delivery"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 履约状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// 未履约
    #[default]
    Unfulfilled,
    /// 已派单给配送服务商
    Dispatched,
    /// 派单失败，需人工处理
    DispatchFailed,
    /// 运输中
    InTransit,
    /// 已完成
    Fulfilled,
    /// 配送被取消
    DeliveryCancelled,
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FulfillmentStatus::Unfulfilled => write!(f, "unfulfilled"),
            FulfillmentStatus::Dispatched => write!(f, "dispatched"),
            FulfillmentStatus::DispatchFailed => write!(f, "dispatch_failed"),
            FulfillmentStatus::InTransit => write!(f, "in_transit"),
            FulfillmentStatus::Fulfilled => write!(f, "fulfilled"),
            FulfillmentStatus::DeliveryCancelled => write!(f, "delivery_cancelled"),
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfulfilled" => Ok(FulfillmentStatus::Unfulfilled),
            "dispatched" => Ok(FulfillmentStatus::Dispatched),
            "dispatch_failed" => Ok(FulfillmentStatus::DispatchFailed),
            "in_transit" => Ok(FulfillmentStatus::InTransit),
            "fulfilled" => Ok(FulfillmentStatus::Fulfilled),
            "delivery_cancelled" => Ok(FulfillmentStatus::DeliveryCancelled),
            _ => Err(()),
        }
    }
}

/// 订单状态变更
///
/// 只写入指定字段，避免覆盖并发写入的其他列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatusChange {
    pub status: Option<OrderStatus>,
    pub fulfillment_status: FulfillmentStatus,
}
