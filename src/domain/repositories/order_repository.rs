// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::order::{Order, OrderStatusChange};
use crate::domain::models::webhook_log::WebhookLog;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 订单仓库特质
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 创建订单，订单号在租户内重复时返回 `AlreadyExists`
    async fn create(&self, order: &Order) -> Result<Order, RepositoryError>;
    /// 根据ID查找订单
    async fn find_by_id(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Order>, RepositoryError>;
    /// 根据订单号查找订单
    async fn find_by_number(
        &self,
        owner_id: Uuid,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError>;
    /// 更新订单的摄取字段（金额、币种、支付、联系人、地址、外部ID）
    ///
    /// 状态列不在写入范围内，并发的状态更新不会被旧快照覆盖。
    async fn update(&self, order: &Order) -> Result<Order, RepositoryError>;
    /// 只更新状态列
    async fn update_status(
        &self,
        owner_id: Uuid,
        id: Uuid,
        change: OrderStatusChange,
    ) -> Result<Order, RepositoryError>;
    /// 在同一事务内更新状态列并追加日志
    async fn update_status_logged(
        &self,
        owner_id: Uuid,
        id: Uuid,
        change: OrderStatusChange,
        log: &WebhookLog,
    ) -> Result<Order, RepositoryError>;
    /// 取消订单；已终结的订单原样返回
    async fn cancel(&self, owner_id: Uuid, id: Uuid) -> Result<Order, RepositoryError>;
}
