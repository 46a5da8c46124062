// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::event::DomainEvent;
use crate::domain::models::order::Order;
use crate::domain::models::webhook::EventType;
use crate::domain::repositories::order_repository::OrderRepository;
use crate::utils::errors::RepositoryError;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 订单入库服务
///
/// `order.created` 与 `order.updated` 按订单号插入或刷新订单，
/// `order.cancelled` 取消尚未送达的订单。
pub struct OrderIngestion {
    orders: Arc<dyn OrderRepository>,
}

impl OrderIngestion {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// 处理订单事件，非订单负载返回 `None`
    pub async fn ingest(
        &self,
        owner_id: Uuid,
        event: &DomainEvent,
    ) -> Result<Option<Order>, BridgeError> {
        let Some(payload) = event.order() else {
            return Ok(None);
        };
        if payload.order_number.trim().is_empty() {
            return Err(BridgeError::IncompleteOrderData(
                "order number is empty".to_string(),
            ));
        }

        let order = match self.upsert(owner_id, event).await? {
            order if event.event_type() == EventType::OrderCancelled => {
                self.cancel(order).await?
            }
            order => order,
        };
        Ok(Some(order))
    }

    async fn upsert(&self, owner_id: Uuid, event: &DomainEvent) -> Result<Order, BridgeError> {
        let Some(payload) = event.order() else {
            return Err(BridgeError::IncompleteOrderData(
                "event carries no order payload".to_string(),
            ));
        };

        if let Some(mut existing) = self
            .orders
            .find_by_number(owner_id, &payload.order_number)
            .await?
        {
            existing.refresh_from(payload);
            debug!("Refreshing order {} from {}", existing.order_number, event.source_provider());
            return Ok(self.orders.update(&existing).await?);
        }

        let order = Order::from_payload(owner_id, event.source_provider(), payload);
        match self.orders.create(&order).await {
            Ok(created) => {
                info!("Ingested order {} for owner {}", created.order_number, owner_id);
                Ok(created)
            }
            // lost a race with a concurrent insert of the same order number
            Err(RepositoryError::AlreadyExists) => {
                let mut existing = self
                    .orders
                    .find_by_number(owner_id, &payload.order_number)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                existing.refresh_from(payload);
                Ok(self.orders.update(&existing).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn cancel(&self, order: Order) -> Result<Order, BridgeError> {
        if order.status.is_terminal() {
            debug!("Order {} is {}, cancellation ignored", order.order_number, order.status);
            return Ok(order);
        }
        info!("Cancelling order {}", order.order_number);
        Ok(self.orders.cancel(order.owner_id, order.id).await?)
    }
}
