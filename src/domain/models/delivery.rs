// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::location::{Address, Contact, Coordinates};
use super::order::{FulfillmentStatus, OrderStatus, OrderStatusChange};
use super::webhook::EventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 配送实体
///
/// 一个订单同一时刻至多有一个未终结的配送。`external_id` 是服务商侧的配送ID，
/// 被受理后设置，在同一服务商内唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    /// 配送唯一标识符
    pub id: Uuid,
    /// 所属租户ID
    pub owner_id: Uuid,
    /// 关联订单，测试配送可为空
    pub order_id: Option<Uuid>,
    /// 派单所用的集成（Webhook定义）ID
    pub integration_id: Option<Uuid>,
    /// 配送服务商
    pub provider: String,
    /// 服务商配送ID
    pub external_id: Option<String>,
    /// 配送状态
    pub status: DeliveryStatus,
    pub pickup_address: Address,
    pub pickup_contact: Option<Contact>,
    pub dropoff_address: Address,
    pub dropoff_contact: Option<Contact>,
    /// 骑手当前位置
    pub current_location: Option<Coordinates>,
    pub pickup_eta: Option<DateTime<Utc>>,
    pub dropoff_eta: Option<DateTime<Utc>>,
    /// 配送费（最小货币单位）
    pub fee: Option<i64>,
    pub currency: Option<String>,
    pub tracking_url: Option<String>,
    /// 服务商返回的附加信息
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    /// 应用状态更新
    ///
    /// 仅当目标状态严格前进时才修改；否则返回 [`InvalidTransition`]，实体保持不变。
    pub fn apply(&mut self, update: &DeliveryStatusUpdate) -> Result<(), InvalidTransition> {
        self.status.check_transition(update.status)?;
        self.status = update.status;
        if update.courier_location.is_some() {
            self.current_location = update.courier_location;
        }
        if update.pickup_eta.is_some() {
            self.pickup_eta = update.pickup_eta;
        }
        if update.dropoff_eta.is_some() {
            self.dropoff_eta = update.dropoff_eta;
        }
        if update.tracking_url.is_some() {
            self.tracking_url = update.tracking_url.clone();
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// 配送状态
///
/// 状态机：`created → assigned → picked_up → in_transit → delivered`，
/// 任一非终结状态都可以进入 `cancelled`。只允许严格前进。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// 已创建
    #[default]
    Created,
    /// 已分配骑手
    Assigned,
    /// 已取货
    PickedUp,
    /// 运输中
    InTransit,
    /// 已送达（成功终态）
    Delivered,
    /// 已取消（失败终态）
    Cancelled,
}

/// 非法状态转换
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid delivery status transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

impl DeliveryStatus {
    fn rank(&self) -> u8 {
        match self {
            DeliveryStatus::Created => 0,
            DeliveryStatus::Assigned => 1,
            DeliveryStatus::PickedUp => 2,
            DeliveryStatus::InTransit => 3,
            DeliveryStatus::Delivered => 4,
            DeliveryStatus::Cancelled => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// 目标状态是否严格在当前状态之前进方向上
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            DeliveryStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    pub fn check_transition(&self, next: DeliveryStatus) -> Result<(), InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// 配送状态对订单的固定映射
    pub fn order_effect(&self) -> OrderStatusChange {
        let (status, fulfillment_status) = match self {
            DeliveryStatus::Created | DeliveryStatus::Assigned => {
                (Some(OrderStatus::Confirmed), FulfillmentStatus::Dispatched)
            }
            DeliveryStatus::PickedUp | DeliveryStatus::InTransit => {
                (Some(OrderStatus::OutForDelivery), FulfillmentStatus::InTransit)
            }
            DeliveryStatus::Delivered => (Some(OrderStatus::Delivered), FulfillmentStatus::Fulfilled),
            DeliveryStatus::Cancelled => (None, FulfillmentStatus::DeliveryCancelled),
        };
        OrderStatusChange {
            status,
            fulfillment_status,
        }
    }

    /// 结合订单当前状态的映射：已终结的订单只同步履约状态
    pub fn order_effect_for(&self, order_status: OrderStatus) -> OrderStatusChange {
        let mut change = self.order_effect();
        if order_status.is_terminal() {
            change.status = None;
        }
        change
    }

    /// 对应的领域事件类型
    pub fn event_type(&self) -> EventType {
        match self {
            DeliveryStatus::Created => EventType::DeliveryCreated,
            DeliveryStatus::Assigned => EventType::DeliveryAssigned,
            DeliveryStatus::PickedUp => EventType::DeliveryPickedUp,
            DeliveryStatus::InTransit => EventType::DeliveryInTransit,
            DeliveryStatus::Delivered => EventType::DeliveryDelivered,
            DeliveryStatus::Cancelled => EventType::DeliveryCancelled,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeliveryStatus::Created => write!(f, "created"),
            DeliveryStatus::Assigned => write!(f, "assigned"),
            DeliveryStatus::PickedUp => write!(f, "picked_up"),
            DeliveryStatus::InTransit => write!(f, "in_transit"),
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(DeliveryStatus::Created),
            "assigned" => Ok(DeliveryStatus::Assigned),
            "picked_up" => Ok(DeliveryStatus::PickedUp),
            "in_transit" => Ok(DeliveryStatus::InTransit),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 配送状态更新
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryStatusUpdate {
    pub status: DeliveryStatus,
    pub courier_location: Option<Coordinates>,
    pub pickup_eta: Option<DateTime<Utc>>,
    pub dropoff_eta: Option<DateTime<Utc>>,
    pub tracking_url: Option<String>,
}

impl DeliveryStatusUpdate {
    pub fn status(status: DeliveryStatus) -> Self {
        Self {
            status,
            courier_location: None,
            pickup_eta: None,
            dropoff_eta: None,
            tracking_url: None,
        }
    }
}

/// 状态更新的结果
#[derive(Debug, Clone)]
pub enum StatusUpdateOutcome {
    /// 已应用，附带更新前状态与更新后的配送
    Applied {
        previous: DeliveryStatus,
        delivery: Delivery,
    },
    /// 非前进转换，已忽略
    Ignored {
        rejected: InvalidTransition,
        delivery: Delivery,
    },
}

/// 派单结果的持久化结果
#[derive(Debug, Clone)]
pub enum DispatchRecord {
    /// 新配送已写入
    Created(Delivery),
    /// 订单已有未终结的配送，新配送未写入
    AlreadyActive(Delivery),
}

impl DispatchRecord {
    pub fn delivery(&self) -> &Delivery {
        match self {
            DispatchRecord::Created(d) | DispatchRecord::AlreadyActive(d) => d,
        }
    }

    pub fn into_delivery(self) -> Delivery {
        match self {
            DispatchRecord::Created(d) | DispatchRecord::AlreadyActive(d) => d,
        }
    }
}
