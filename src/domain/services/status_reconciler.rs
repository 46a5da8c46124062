// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::delivery::{DeliveryStatus, DeliveryStatusUpdate, StatusUpdateOutcome};
use crate::domain::models::event::DomainEvent;
use crate::domain::models::webhook::{normalize_provider, WebhookDefinition};
use crate::domain::models::webhook_log::{LogStatus, WebhookLog};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::utils::keyed_mutex::KeyedMutex;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 将服务商状态词汇映射为内部配送状态
///
/// 未识别的服务商回退到内部状态名本身（如 `picked_up`）。
pub fn map_provider_status(provider: &str, raw: &str) -> Option<DeliveryStatus> {
    let mapped = match normalize_provider(provider).as_str() {
        "uberdirect" | "uber" => match raw.to_ascii_lowercase().as_str() {
            "pending" => Some(DeliveryStatus::Created),
            "pickup" => Some(DeliveryStatus::Assigned),
            "pickup_complete" => Some(DeliveryStatus::PickedUp),
            "dropoff" => Some(DeliveryStatus::InTransit),
            "delivered" => Some(DeliveryStatus::Delivered),
            "canceled" | "cancelled" | "returned" => Some(DeliveryStatus::Cancelled),
            _ => None,
        },
        "doordash" | "doordashdrive" => match raw.to_ascii_uppercase().as_str() {
            "DELIVERY_CREATED" => Some(DeliveryStatus::Created),
            "DASHER_CONFIRMED" | "DASHER_ENROUTE_TO_PICKUP" | "DASHER_CONFIRMED_PICKUP_ARRIVAL" => {
                Some(DeliveryStatus::Assigned)
            }
            "DASHER_PICKED_UP" => Some(DeliveryStatus::PickedUp),
            "DASHER_ENROUTE_TO_DROPOFF" | "DASHER_CONFIRMED_DROPOFF_ARRIVAL" => {
                Some(DeliveryStatus::InTransit)
            }
            "DASHER_DROPPED_OFF" => Some(DeliveryStatus::Delivered),
            "DELIVERY_CANCELLED" | "DELIVERY_RETURNED" => Some(DeliveryStatus::Cancelled),
            _ => None,
        },
        _ => None,
    };
    mapped.or_else(|| raw.to_ascii_lowercase().parse().ok())
}

/// 状态协调结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// 转换已应用
    Applied {
        delivery_id: Uuid,
        from: DeliveryStatus,
        to: DeliveryStatus,
    },
    /// 非前进转换，已记录并忽略
    Ignored {
        delivery_id: Uuid,
        current: DeliveryStatus,
        rejected: DeliveryStatus,
    },
}

impl ReconcileOutcome {
    fn note(&self) -> String {
        match self {
            ReconcileOutcome::Applied { from, to, .. } => format!("{} -> {}", from, to),
            ReconcileOutcome::Ignored {
                current, rejected, ..
            } => format!("ignored out-of-order transition {} -> {}", current, rejected),
        }
    }
}

impl From<&StatusUpdateOutcome> for ReconcileOutcome {
    fn from(outcome: &StatusUpdateOutcome) -> Self {
        match outcome {
            StatusUpdateOutcome::Applied { previous, delivery } => ReconcileOutcome::Applied {
                delivery_id: delivery.id,
                from: *previous,
                to: delivery.status,
            },
            StatusUpdateOutcome::Ignored { rejected, delivery } => ReconcileOutcome::Ignored {
                delivery_id: delivery.id,
                current: rejected.from,
                rejected: rejected.to,
            },
        }
    }
}

/// 状态协调器
///
/// 处理配送服务商的状态回调：查找配送、校验状态机、更新配送与订单，
/// 并为每一次回调写入日志。配送、订单与日志在同一事务内写入；
/// 同一配送的回调在进程内串行执行，仓库层的行锁负责跨进程串行。
pub struct StatusReconciler {
    deliveries: Arc<dyn DeliveryRepository>,
    logs: Arc<dyn WebhookLogRepository>,
    delivery_locks: KeyedMutex<Uuid>,
}

impl StatusReconciler {
    pub fn new(
        deliveries: Arc<dyn DeliveryRepository>,
        logs: Arc<dyn WebhookLogRepository>,
    ) -> Self {
        Self {
            deliveries,
            logs,
            delivery_locks: KeyedMutex::new(),
        }
    }

    /// 协调一次配送状态回调
    ///
    /// 事件不携带配送状态负载时返回 `None`。
    pub async fn reconcile(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
    ) -> Result<Option<ReconcileOutcome>, BridgeError> {
        let Some(status) = event.delivery_status() else {
            return Ok(None);
        };
        let owner_id = webhook.owner_id;
        let provider = normalize_provider(event.source_provider());
        let request_body = serde_json::to_string(status).ok();

        let Some(target) = map_provider_status(&provider, &status.provider_status) else {
            let message = format!("unknown provider status {}", status.provider_status);
            self.append_log(
                WebhookLog::for_event(webhook, event, LogStatus::Failed)
                    .with_error(message.clone())
                    .with_request_body(request_body.clone()),
            )
            .await?;
            return Err(BridgeError::Decode(message));
        };

        let Some(delivery) = self
            .deliveries
            .find_by_external_id(owner_id, &provider, &status.external_delivery_id)
            .await?
        else {
            let err = BridgeError::UnknownDelivery {
                provider: provider.clone(),
                external_id: status.external_delivery_id.clone(),
            };
            warn!("{}", err);
            self.append_log(
                WebhookLog::for_event(webhook, event, LogStatus::Failed)
                    .with_error(err.to_string())
                    .with_request_body(request_body.clone()),
            )
            .await?;
            return Err(err);
        };

        let update = DeliveryStatusUpdate {
            status: target,
            courier_location: status.courier_location,
            pickup_eta: status.pickup_eta,
            dropoff_eta: status.dropoff_eta,
            tracking_url: status.tracking_url.clone(),
        };

        let build_log = |outcome: &StatusUpdateOutcome| {
            let reconciled = ReconcileOutcome::from(outcome);
            WebhookLog::for_event(webhook, event, LogStatus::Success)
                .with_request_body(request_body.clone())
                .with_response(Some(200), serde_json::to_string(&reconciled).ok())
                .with_note(reconciled.note())
        };

        let _guard = self.delivery_locks.lock(delivery.id).await;
        let outcome = ReconcileOutcome::from(
            &self
                .deliveries
                .apply_status_update(owner_id, delivery.id, &update, &build_log)
                .await?,
        );

        match &outcome {
            ReconcileOutcome::Applied { delivery_id, from, to } => {
                counter!("orderbridge_status_transitions_total", "result" => "applied").increment(1);
                info!("Delivery {} moved {} -> {}", delivery_id, from, to);
            }
            ReconcileOutcome::Ignored {
                delivery_id,
                current,
                rejected,
            } => {
                counter!("orderbridge_status_transitions_total", "result" => "ignored").increment(1);
                warn!(
                    "Delivery {}: out-of-order transition {} -> {}, ignoring",
                    delivery_id, current, rejected
                );
            }
        }

        Ok(Some(outcome))
    }

    async fn append_log(&self, log: WebhookLog) -> Result<(), BridgeError> {
        self.logs.append(&log).await?;
        Ok(())
    }
}
