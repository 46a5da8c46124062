// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::delivery::{Delivery, DispatchRecord};
use crate::domain::models::event::DomainEvent;
use crate::domain::models::order::{FulfillmentStatus, Order, OrderStatusChange};
use crate::domain::models::webhook::{normalize_provider, EndpointType, EventType, WebhookDefinition};
use crate::domain::models::webhook_log::{LogStatus, WebhookLog};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::order_repository::OrderRepository;
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::{CreateDeliveryRequest, CreateDeliveryResponse, ProviderError};
use crate::utils::keyed_mutex::KeyedMutex;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// 订单已有未终结配送时的日志说明
pub const ALREADY_DISPATCHED_NOTE: &str = "already dispatched";

/// 一次派单尝试的结果
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// 服务商已受理，新配送已写入
    Dispatched(Delivery),
    /// 订单已有未终结的配送
    AlreadyDispatched(Delivery),
    /// 订单不应派单（已取消、已终结或已履约），不重试
    Skipped { reason: String },
}

/// 配送派单器
///
/// 把订单事件翻译为配送服务商的创建请求，持久化返回的配送并记录结果。
/// 同一订单的派单串行执行，且同一时刻至多一个未终结的配送：
/// 进程内由订单锁串行，写入时在事务内锁定订单行再次确认。
pub struct DeliveryDispatcher {
    orders: Arc<dyn OrderRepository>,
    deliveries: Arc<dyn DeliveryRepository>,
    logs: Arc<dyn WebhookLogRepository>,
    providers: Arc<ProviderRegistry>,
    timeout: Duration,
    order_locks: KeyedMutex<Uuid>,
}

impl DeliveryDispatcher {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        deliveries: Arc<dyn DeliveryRepository>,
        logs: Arc<dyn WebhookLogRepository>,
        providers: Arc<ProviderRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            orders,
            deliveries,
            logs,
            providers,
            timeout,
            order_locks: KeyedMutex::new(),
        }
    }

    /// 执行一次派单尝试
    ///
    /// # 参数
    ///
    /// * `webhook` - 目标为配送服务商的Webhook定义
    /// * `event` - 携带订单负载的领域事件
    /// * `attempt` - 尝试序号（从 1 开始）
    ///
    /// # 返回值
    ///
    /// * `Ok(DispatchOutcome)` - 新建、已存在或跳过
    /// * `Err(BridgeError)` - 失败；瞬时服务商错误由调用方交给重试管理器
    pub async fn dispatch(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        attempt: u32,
    ) -> Result<DispatchOutcome, BridgeError> {
        let order = match self.load_order(webhook, event).await {
            Ok(order) => order,
            Err(e) => return Err(self.reject(webhook, event, attempt, e).await?),
        };

        let _guard = self.order_locks.lock(order.id).await;
        // the order may have moved while waiting for the lock
        let order = self
            .orders
            .find_by_id(order.owner_id, order.id)
            .await?
            .unwrap_or(order);

        if let Some(reason) = skip_reason(event, &order) {
            info!("Not dispatching order {}: {}", order.order_number, reason);
            counter!("orderbridge_dispatch_total", "outcome" => "skipped").increment(1);
            let log = self
                .log(webhook, event, attempt, LogStatus::Success)
                .with_note(format!("not dispatched: {}", reason));
            self.logs.append(&log).await?;
            return Ok(DispatchOutcome::Skipped { reason });
        }

        if let Some(existing) = self.deliveries.find_active_by_order(order.owner_id, order.id).await? {
            info!(
                "Order {} already has active delivery {}, skipping dispatch",
                order.order_number, existing.id
            );
            let log = self
                .log(webhook, event, attempt, LogStatus::Success)
                .with_response(Some(200), Some(delivery_summary(&existing)))
                .with_note(ALREADY_DISPATCHED_NOTE);
            self.logs.append(&log).await?;
            return Ok(DispatchOutcome::AlreadyDispatched(existing));
        }

        let request = match self.build_request(webhook, event, &order) {
            Ok(request) => request,
            Err(e) => return Err(self.reject(webhook, event, attempt, e).await?),
        };
        let request_body = serde_json::to_string(&request).ok();

        let Some(provider) = self.providers.get(&webhook.destination_provider) else {
            let err = BridgeError::UnsupportedProvider {
                endpoint_type: EndpointType::Delivery,
                provider: webhook.destination_provider.clone(),
            };
            self.fail_permanently(webhook, event, &order, attempt, request_body, &err)
                .await?;
            return Err(err);
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, provider.create_delivery(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };
        histogram!("orderbridge_provider_call_duration_seconds", "provider" => provider.name().to_string())
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                let record = self
                    .record_success(webhook, event, &order, attempt, &request, request_body, response)
                    .await?;
                counter!("orderbridge_dispatch_total", "outcome" => "success").increment(1);
                match record {
                    DispatchRecord::Created(delivery) => {
                        info!(
                            "Dispatched order {} to {} as delivery {} (attempt {})",
                            order.order_number, webhook.destination_provider, delivery.id, attempt
                        );
                        Ok(DispatchOutcome::Dispatched(delivery))
                    }
                    DispatchRecord::AlreadyActive(existing) => {
                        warn!(
                            "Order {} gained active delivery {} during dispatch, keeping it",
                            order.order_number, existing.id
                        );
                        Ok(DispatchOutcome::AlreadyDispatched(existing))
                    }
                }
            }
            Err(provider_error) if provider_error.is_transient() => {
                counter!("orderbridge_dispatch_total", "outcome" => "transient").increment(1);
                warn!(
                    "Transient failure dispatching order {} (attempt {}): {}",
                    order.order_number, attempt, provider_error
                );
                let log = self
                    .log(webhook, event, attempt, LogStatus::Failed)
                    .with_request_body(request_body)
                    .with_response(provider_error.status().map(i32::from), None)
                    .with_error(provider_error.to_string());
                self.logs.append(&log).await?;
                Err(provider_error.into())
            }
            Err(provider_error) => {
                let err = BridgeError::Provider(provider_error);
                self.fail_permanently(webhook, event, &order, attempt, request_body, &err)
                    .await?;
                Err(err)
            }
        }
    }

    /// 记录无法派单的事件并返回原错误
    async fn reject(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        attempt: u32,
        err: BridgeError,
    ) -> Result<BridgeError, BridgeError> {
        warn!("Cannot dispatch event {} for webhook {}: {}", event.idempotency_key(), webhook.id, err);
        let log = self
            .log(webhook, event, attempt, LogStatus::Failed)
            .with_error(err.to_string());
        self.logs.append(&log).await?;
        Ok(err)
    }

    async fn load_order(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
    ) -> Result<Order, BridgeError> {
        let payload = event.order().ok_or_else(|| {
            BridgeError::IncompleteOrderData("event carries no order payload".to_string())
        })?;
        self.orders
            .find_by_number(webhook.owner_id, &payload.order_number)
            .await?
            .ok_or_else(|| {
                BridgeError::IncompleteOrderData(format!("order {} not found", payload.order_number))
            })
    }

    /// 校验订单数据并构建服务商请求
    fn build_request(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        order: &Order,
    ) -> Result<CreateDeliveryRequest, BridgeError> {
        let payload = event.order().ok_or_else(|| {
            BridgeError::IncompleteOrderData("event carries no order payload".to_string())
        })?;

        let pickup = payload
            .pickup
            .clone()
            .or_else(|| webhook.pickup.clone())
            .ok_or_else(|| BridgeError::IncompleteOrderData("missing pickup location".to_string()))?;
        let dropoff_address = payload
            .dropoff
            .clone()
            .or_else(|| order.dropoff.clone())
            .ok_or_else(|| BridgeError::IncompleteOrderData("missing dropoff address".to_string()))?;
        let dropoff_contact = payload
            .customer
            .clone()
            .or_else(|| order.customer.clone())
            .ok_or_else(|| BridgeError::IncompleteOrderData("missing dropoff contact".to_string()))?;

        let mut missing: Vec<String> = Vec::new();
        missing.extend(pickup.address.missing_fields().into_iter().map(|f| format!("pickup.{}", f)));
        missing.extend(pickup.contact.missing_fields().into_iter().map(|f| format!("pickup.contact.{}", f)));
        missing.extend(dropoff_address.missing_fields().into_iter().map(|f| format!("dropoff.{}", f)));
        missing.extend(dropoff_contact.missing_fields().into_iter().map(|f| format!("dropoff.contact.{}", f)));
        if !missing.is_empty() {
            return Err(BridgeError::IncompleteOrderData(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        Ok(CreateDeliveryRequest {
            owner_id: order.owner_id,
            order_id: order.id,
            order_number: order.order_number.clone(),
            pickup_name: pickup.name,
            pickup_address: pickup.address,
            pickup_contact: pickup.contact,
            dropoff_address,
            dropoff_contact,
            items: payload.items.clone(),
            order_value: payload.total_amount.unwrap_or(order.total_amount),
            currency: order.currency.clone(),
            notes: payload.notes.clone(),
            idempotency_key: event.idempotency_key().to_string(),
        })
    }

    /// 在一个事务内写入配送、同步订单并追加成功日志
    #[allow(clippy::too_many_arguments)]
    async fn record_success(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        order: &Order,
        attempt: u32,
        request: &CreateDeliveryRequest,
        request_body: Option<String>,
        response: CreateDeliveryResponse,
    ) -> Result<DispatchRecord, BridgeError> {
        let now = Utc::now();
        let delivery = Delivery {
            id: Uuid::new_v4(),
            owner_id: order.owner_id,
            order_id: Some(order.id),
            integration_id: Some(webhook.id),
            provider: normalize_provider(&webhook.destination_provider),
            external_id: Some(response.external_id),
            status: response.status,
            pickup_address: request.pickup_address.clone(),
            pickup_contact: Some(request.pickup_contact.clone()),
            dropoff_address: request.dropoff_address.clone(),
            dropoff_contact: Some(request.dropoff_contact.clone()),
            current_location: None,
            pickup_eta: response.pickup_eta,
            dropoff_eta: response.dropoff_eta,
            fee: response.fee,
            currency: response.currency.or_else(|| Some(order.currency.clone())),
            tracking_url: response.tracking_url,
            metadata: serde_json::json!({
                "idempotency_key": event.idempotency_key(),
                "source_provider": event.source_provider(),
            }),
            created_at: now,
            updated_at: now,
        };

        let build_log = |record: &DispatchRecord| {
            let log = WebhookLog::for_event(webhook, event, LogStatus::Success)
                .with_attempt(attempt)
                .with_request_body(request_body.clone())
                .with_response(Some(200), Some(delivery_summary(record.delivery())));
            match record {
                DispatchRecord::Created(_) => log,
                DispatchRecord::AlreadyActive(_) => log.with_note(ALREADY_DISPATCHED_NOTE),
            }
        };
        Ok(self.deliveries.record_dispatch(&delivery, &build_log).await?)
    }

    async fn fail_permanently(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        order: &Order,
        attempt: u32,
        request_body: Option<String>,
        err: &BridgeError,
    ) -> Result<(), BridgeError> {
        counter!("orderbridge_dispatch_total", "outcome" => "permanent").increment(1);
        error!("Permanent failure dispatching order {}: {}", order.order_number, err);
        let status = match err {
            BridgeError::Provider(e) => e.status().map(i32::from),
            _ => None,
        };
        let log = self
            .log(webhook, event, attempt, LogStatus::Failed)
            .with_request_body(request_body)
            .with_response(status, None)
            .with_error(err.to_string());
        let change = OrderStatusChange {
            status: None,
            fulfillment_status: FulfillmentStatus::DispatchFailed,
        };
        self.orders
            .update_status_logged(order.owner_id, order.id, change, &log)
            .await?;
        Ok(())
    }

    fn log(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        attempt: u32,
        status: LogStatus,
    ) -> WebhookLog {
        WebhookLog::for_event(webhook, event, status).with_attempt(attempt)
    }
}

/// 不应派单的原因
fn skip_reason(event: &DomainEvent, order: &Order) -> Option<String> {
    if event.event_type() == EventType::OrderCancelled {
        return Some("order cancellation events are not dispatched".to_string());
    }
    if order.status.is_terminal() {
        return Some(format!("order is {}", order.status));
    }
    if order.fulfillment_status == FulfillmentStatus::Fulfilled {
        return Some("order is already fulfilled".to_string());
    }
    None
}

fn delivery_summary(delivery: &Delivery) -> String {
    serde_json::json!({
        "delivery_id": delivery.id,
        "external_id": delivery.external_id,
        "status": delivery.status,
        "tracking_url": delivery.tracking_url,
    })
    .to_string()
}
