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

use super::order_repo_impl::{apply_status_change, lock_order};
use super::webhook_log_repo_impl::insert_log;
use super::{from_json, from_json_opt, to_json};
use crate::domain::models::delivery::{
    Delivery, DeliveryStatusUpdate, DispatchRecord, StatusUpdateOutcome,
};
use crate::domain::models::location::Coordinates;
use crate::domain::models::order::OrderStatus;
use crate::domain::models::webhook_log::WebhookLog;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::infrastructure::database::entities::delivery;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaDeliveryStatus;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 配送仓库实现
///
/// 状态更新在事务内对行加排他锁，读取、校验转换、写回、同步订单与追加日志
/// 原子完成；派单记录锁定订单行。
#[derive(Clone)]
pub struct DeliveryRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DeliveryRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_active_model(d: &Delivery) -> Result<delivery::ActiveModel, RepositoryError> {
    Ok(delivery::ActiveModel {
        id: Set(d.id),
        owner_id: Set(d.owner_id),
        order_id: Set(d.order_id),
        integration_id: Set(d.integration_id),
        provider: Set(d.provider.clone()),
        external_id: Set(d.external_id.clone()),
        status: Set(d.status.into()),
        pickup_address: Set(to_json(&d.pickup_address)?),
        pickup_contact: Set(d.pickup_contact.as_ref().map(to_json).transpose()?),
        dropoff_address: Set(to_json(&d.dropoff_address)?),
        dropoff_contact: Set(d.dropoff_contact.as_ref().map(to_json).transpose()?),
        current_lat: Set(d.current_location.map(|c| c.lat)),
        current_lng: Set(d.current_location.map(|c| c.lng)),
        pickup_eta: Set(d.pickup_eta.map(Into::into)),
        dropoff_eta: Set(d.dropoff_eta.map(Into::into)),
        fee: Set(d.fee),
        currency: Set(d.currency.clone()),
        tracking_url: Set(d.tracking_url.clone()),
        metadata: Set(d.metadata.clone()),
        created_at: Set(d.created_at.into()),
        updated_at: Set(d.updated_at.into()),
    })
}

async fn active_for_order<C: ConnectionTrait>(
    conn: &C,
    owner_id: Uuid,
    order_id: Uuid,
) -> Result<Option<Delivery>, RepositoryError> {
    delivery::Entity::find()
        .filter(delivery::Column::OwnerId.eq(owner_id))
        .filter(delivery::Column::OrderId.eq(order_id))
        .filter(
            delivery::Column::Status
                .is_not_in([SeaDeliveryStatus::Delivered, SeaDeliveryStatus::Cancelled]),
        )
        .order_by_desc(delivery::Column::CreatedAt)
        .one(conn)
        .await?
        .map(TryInto::try_into)
        .transpose()
}

async fn insert_delivery<C: ConnectionTrait>(conn: &C, d: &Delivery) -> Result<(), RepositoryError> {
    delivery::Entity::insert(to_active_model(d)?)
        .exec(conn)
        .await
        .map_err(RepositoryError::from_insert)?;
    Ok(())
}

impl TryFrom<delivery::Model> for Delivery {
    type Error = RepositoryError;

    fn try_from(model: delivery::Model) -> Result<Self, Self::Error> {
        let current_location = match (model.current_lat, model.current_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };

        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            order_id: model.order_id,
            integration_id: model.integration_id,
            provider: model.provider,
            external_id: model.external_id,
            status: model.status.into(),
            pickup_address: from_json(model.pickup_address)?,
            pickup_contact: from_json_opt(model.pickup_contact)?,
            dropoff_address: from_json(model.dropoff_address)?,
            dropoff_contact: from_json_opt(model.dropoff_contact)?,
            current_location,
            pickup_eta: model.pickup_eta.map(Into::into),
            dropoff_eta: model.dropoff_eta.map(Into::into),
            fee: model.fee,
            currency: model.currency,
            tracking_url: model.tracking_url,
            metadata: model.metadata,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

#[async_trait]
impl DeliveryRepository for DeliveryRepositoryImpl {
    async fn create(&self, d: &Delivery) -> Result<Delivery, RepositoryError> {
        insert_delivery(self.db.as_ref(), d).await?;
        Ok(d.clone())
    }

    async fn find_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Delivery>, RepositoryError> {
        delivery::Entity::find_by_id(id)
            .filter(delivery::Column::OwnerId.eq(owner_id))
            .one(self.db.as_ref())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_active_by_order(
        &self,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Delivery>, RepositoryError> {
        active_for_order(self.db.as_ref(), owner_id, order_id).await
    }

    async fn find_by_external_id(
        &self,
        owner_id: Uuid,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Delivery>, RepositoryError> {
        delivery::Entity::find()
            .filter(delivery::Column::OwnerId.eq(owner_id))
            .filter(delivery::Column::Provider.eq(provider))
            .filter(delivery::Column::ExternalId.eq(external_id))
            .one(self.db.as_ref())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn apply_status_update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: &DeliveryStatusUpdate,
        log: &(dyn for<'a> Fn(&'a StatusUpdateOutcome) -> WebhookLog + Send + Sync),
    ) -> Result<StatusUpdateOutcome, RepositoryError> {
        let txn = self.db.begin().await?;

        let model = delivery::Entity::find_by_id(id)
            .filter(delivery::Column::OwnerId.eq(owner_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut current: Delivery = model.try_into()?;
        let previous = current.status;

        let outcome = match current.apply(update) {
            Ok(()) => {
                let mut active = to_active_model(&current)?;
                active.created_at = NotSet;
                let updated: Delivery = active.update(&txn).await?.try_into()?;

                if let Some(order_id) = updated.order_id {
                    if let Some(order) = lock_order(&txn, owner_id, order_id).await? {
                        let change = updated.status.order_effect_for(OrderStatus::from(order.status));
                        apply_status_change(&txn, order, change).await?;
                    }
                }
                StatusUpdateOutcome::Applied {
                    previous,
                    delivery: updated,
                }
            }
            Err(rejected) => {
                debug!("Delivery {} kept at {}: {}", id, previous, rejected);
                StatusUpdateOutcome::Ignored {
                    rejected,
                    delivery: current,
                }
            }
        };

        insert_log(&txn, &log(&outcome)).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    async fn record_dispatch(
        &self,
        d: &Delivery,
        log: &(dyn for<'a> Fn(&'a DispatchRecord) -> WebhookLog + Send + Sync),
    ) -> Result<DispatchRecord, RepositoryError> {
        let txn = self.db.begin().await?;

        let record = match d.order_id {
            Some(order_id) => {
                let order = lock_order(&txn, d.owner_id, order_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                match active_for_order(&txn, d.owner_id, order_id).await? {
                    Some(existing) => {
                        debug!("Order {} already has active delivery {}", order_id, existing.id);
                        DispatchRecord::AlreadyActive(existing)
                    }
                    None => {
                        insert_delivery(&txn, d).await?;
                        let change = d.status.order_effect_for(OrderStatus::from(order.status));
                        apply_status_change(&txn, order, change).await?;
                        DispatchRecord::Created(d.clone())
                    }
                }
            }
            None => {
                insert_delivery(&txn, d).await?;
                DispatchRecord::Created(d.clone())
            }
        };

        insert_log(&txn, &log(&record)).await?;
        txn.commit().await?;
        Ok(record)
    }
}
