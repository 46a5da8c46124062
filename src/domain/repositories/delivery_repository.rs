// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{
    Delivery, DeliveryStatusUpdate, DispatchRecord, StatusUpdateOutcome,
};
use crate::domain::models::webhook_log::WebhookLog;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 配送仓库特质
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// 创建配送
    async fn create(&self, delivery: &Delivery) -> Result<Delivery, RepositoryError>;
    /// 根据ID查找配送
    async fn find_by_id(&self, owner_id: Uuid, id: Uuid)
        -> Result<Option<Delivery>, RepositoryError>;
    /// 查找订单当前未终结的配送
    async fn find_active_by_order(
        &self,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Delivery>, RepositoryError>;
    /// 根据服务商配送ID查找
    async fn find_by_external_id(
        &self,
        owner_id: Uuid,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Delivery>, RepositoryError>;
    /// 原子地应用状态更新
    ///
    /// 在单个事务内读取当前状态、校验转换、写入新状态、同步关联订单并追加
    /// `log` 生成的日志；实现必须锁定该行，使同一配送的并发回调串行化。
    /// 非前进转换返回 `Ignored`，只写日志。任一步失败则整体回滚。
    async fn apply_status_update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: &DeliveryStatusUpdate,
        log: &(dyn for<'a> Fn(&'a StatusUpdateOutcome) -> WebhookLog + Send + Sync),
    ) -> Result<StatusUpdateOutcome, RepositoryError>;
    /// 原子地记录派单结果
    ///
    /// 在单个事务内锁定订单行、确认订单没有未终结的配送、写入配送、
    /// 同步订单状态并追加 `log` 生成的日志。已有未终结配送时返回
    /// `AlreadyActive`，不写入新配送。
    async fn record_dispatch(
        &self,
        delivery: &Delivery,
        log: &(dyn for<'a> Fn(&'a DispatchRecord) -> WebhookLog + Send + Sync),
    ) -> Result<DispatchRecord, RepositoryError>;
}
