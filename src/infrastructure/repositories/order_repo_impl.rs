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

use super::webhook_log_repo_impl::insert_log;
use super::{from_json_opt, to_json};
use crate::domain::models::order::{Order, OrderStatus, OrderStatusChange};
use crate::domain::models::webhook_log::WebhookLog;
use crate::domain::repositories::order_repository::OrderRepository;
use crate::infrastructure::database::entities::order;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 订单仓库实现
///
/// 订单号在租户内唯一，由数据库唯一索引保证。
#[derive(Clone)]
pub struct OrderRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl OrderRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<order::Model>, RepositoryError> {
        Ok(order::Entity::find_by_id(id)
            .filter(order::Column::OwnerId.eq(owner_id))
            .one(self.db.as_ref())
            .await?)
    }
}

fn to_active_model(order: &Order) -> Result<order::ActiveModel, RepositoryError> {
    Ok(order::ActiveModel {
        id: Set(order.id),
        owner_id: Set(order.owner_id),
        order_number: Set(order.order_number.clone()),
        external_id: Set(order.external_id.clone()),
        status: Set(order.status.into()),
        total_amount: Set(order.total_amount),
        source: Set(order.source.clone()),
        currency: Set(order.currency.clone()),
        payment_status: Set(order.payment_status.clone()),
        fulfillment_status: Set(order.fulfillment_status.into()),
        customer: Set(order.customer.as_ref().map(to_json).transpose()?),
        dropoff: Set(order.dropoff.as_ref().map(to_json).transpose()?),
        created_at: Set(order.created_at.into()),
        updated_at: Set(order.updated_at.into()),
    })
}

/// 在事务内锁定并读取订单行
pub(super) async fn lock_order<C: ConnectionTrait>(
    conn: &C,
    owner_id: Uuid,
    id: Uuid,
) -> Result<Option<order::Model>, RepositoryError> {
    Ok(order::Entity::find_by_id(id)
        .filter(order::Column::OwnerId.eq(owner_id))
        .lock_exclusive()
        .one(conn)
        .await?)
}

/// 只写入状态列
pub(super) async fn apply_status_change<C: ConnectionTrait>(
    conn: &C,
    model: order::Model,
    change: OrderStatusChange,
) -> Result<order::Model, RepositoryError> {
    let mut active: order::ActiveModel = model.into();
    if let Some(status) = change.status {
        active.status = Set(status.into());
    }
    active.fulfillment_status = Set(change.fulfillment_status.into());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

impl TryFrom<order::Model> for Order {
    type Error = RepositoryError;

    fn try_from(model: order::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            order_number: model.order_number,
            external_id: model.external_id,
            status: model.status.into(),
            total_amount: model.total_amount,
            source: model.source,
            currency: model.currency,
            payment_status: model.payment_status,
            fulfillment_status: model.fulfillment_status.into(),
            customer: from_json_opt(model.customer)?,
            dropoff: from_json_opt(model.dropoff)?,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

#[async_trait]
impl OrderRepository for OrderRepositoryImpl {
    async fn create(&self, order: &Order) -> Result<Order, RepositoryError> {
        order::Entity::insert(to_active_model(order)?)
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::from_insert)?;

        Ok(order.clone())
    }

    async fn find_by_id(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        self.find_model(owner_id, id)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_number(
        &self,
        owner_id: Uuid,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        order::Entity::find()
            .filter(order::Column::OwnerId.eq(owner_id))
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(self.db.as_ref())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        if self.find_model(order.owner_id, order.id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let active = order::ActiveModel {
            id: Unchanged(order.id),
            external_id: Set(order.external_id.clone()),
            total_amount: Set(order.total_amount),
            currency: Set(order.currency.clone()),
            payment_status: Set(order.payment_status.clone()),
            customer: Set(order.customer.as_ref().map(to_json).transpose()?),
            dropoff: Set(order.dropoff.as_ref().map(to_json).transpose()?),
            updated_at: Set(order.updated_at.into()),
            ..Default::default()
        };

        let updated = active.update(self.db.as_ref()).await?;
        updated.try_into()
    }

    async fn update_status(
        &self,
        owner_id: Uuid,
        id: Uuid,
        change: OrderStatusChange,
    ) -> Result<Order, RepositoryError> {
        let model = self
            .find_model(owner_id, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        apply_status_change(self.db.as_ref(), model, change)
            .await?
            .try_into()
    }

    async fn update_status_logged(
        &self,
        owner_id: Uuid,
        id: Uuid,
        change: OrderStatusChange,
        log: &WebhookLog,
    ) -> Result<Order, RepositoryError> {
        let txn = self.db.begin().await?;

        let model = lock_order(&txn, owner_id, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let updated = apply_status_change(&txn, model, change).await?;
        insert_log(&txn, log).await?;

        txn.commit().await?;
        updated.try_into()
    }

    async fn cancel(&self, owner_id: Uuid, id: Uuid) -> Result<Order, RepositoryError> {
        let txn = self.db.begin().await?;

        let model = lock_order(&txn, owner_id, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if OrderStatus::from(model.status).is_terminal() {
            txn.commit().await?;
            return model.try_into();
        }

        let mut active: order::ActiveModel = model.into();
        active.status = Set(OrderStatus::Cancelled.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        updated.try_into()
    }
}
