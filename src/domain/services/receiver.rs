// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::registry::DecoderRegistry;
use crate::decoders::traits::InboundRequest;
use crate::domain::errors::BridgeError;
use crate::domain::models::event::DomainEvent;
use crate::domain::models::webhook::{normalize_provider, EndpointType, WebhookDefinition};
use crate::domain::models::webhook_log::{LogStatus, WebhookLog};
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::event_router::{EventRouter, JobResult};
use crate::domain::services::order_ingestion::OrderIngestion;
use crate::domain::services::status_reconciler::{ReconcileOutcome, StatusReconciler};
use crate::utils::keyed_mutex::KeyedMutex;
use metrics::counter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 无匹配订阅时写入日志的说明
pub const NO_SUBSCRIPTION_NOTE: &str = "no active subscription";
/// 幂等重放日志的说明
pub const REPLAY_NOTE: &str = "idempotent replay";

/// 入站事件的处理回执
#[derive(Debug, Clone, Serialize)]
pub struct InboundAck {
    /// 是否为重复投递的重放
    pub replay: bool,
    pub idempotency_key: String,
    pub event_type: String,
    /// 关联的订单ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    /// 状态协调结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconcileOutcome>,
    /// 扇出任务结果
    pub jobs: Vec<JobResult>,
    /// 重放时返回首次成功处理记录的响应
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response: Option<serde_json::Value>,
}

/// 入站Webhook接收器
///
/// 认证、解码、去重，然后把事件交给订单入库、状态协调与事件路由。
/// 相同幂等键的并发投递在进程内串行处理。
pub struct WebhookReceiver {
    webhooks: Arc<dyn WebhookRepository>,
    logs: Arc<dyn WebhookLogRepository>,
    decoders: Arc<DecoderRegistry>,
    ingestion: Arc<OrderIngestion>,
    reconciler: Arc<StatusReconciler>,
    router: Arc<EventRouter>,
    signing_secrets: HashMap<String, String>,
    key_locks: KeyedMutex<String>,
}

impl WebhookReceiver {
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        logs: Arc<dyn WebhookLogRepository>,
        decoders: Arc<DecoderRegistry>,
        ingestion: Arc<OrderIngestion>,
        reconciler: Arc<StatusReconciler>,
        router: Arc<EventRouter>,
    ) -> Self {
        Self {
            webhooks,
            logs,
            decoders,
            ingestion,
            reconciler,
            router,
            signing_secrets: HashMap::new(),
            key_locks: KeyedMutex::new(),
        }
    }

    /// 配置服务商签名密钥，配置后该服务商的请求必须携带有效签名
    pub fn with_signing_secrets(mut self, secrets: HashMap<String, String>) -> Self {
        self.signing_secrets = secrets
            .into_iter()
            .map(|(provider, secret)| (normalize_provider(&provider), secret))
            .collect();
        self
    }

    /// 处理一次入站Webhook请求
    ///
    /// # 参数
    ///
    /// * `secret_key` - 路径中的Webhook密钥
    /// * `request` - 原始请求头与正文
    pub async fn receive(
        &self,
        secret_key: &str,
        request: InboundRequest,
    ) -> Result<InboundAck, BridgeError> {
        let webhook = match self.webhooks.find_by_secret(secret_key).await? {
            Some(def) if def.is_active => def,
            _ => {
                counter!("orderbridge_inbound_events_total", "outcome" => "unauthenticated")
                    .increment(1);
                return Err(BridgeError::Authentication);
            }
        };

        let event = match self.decode(&webhook, &request) {
            Ok(event) => event,
            Err(err) => {
                counter!("orderbridge_inbound_events_total", "outcome" => "rejected").increment(1);
                warn!("Rejected payload for webhook {}: {}", webhook.id, err);
                let log = WebhookLog::new(webhook.owner_id, webhook.id, LogStatus::Failed)
                    .with_request(request.body_text())
                    .with_error(err.to_string());
                self.logs.append(&log).await?;
                return Err(err);
            }
        };

        let _guard = self.key_locks.lock(event.idempotency_key().to_string()).await;

        if let Some(previous) = self
            .logs
            .find_success_by_key(webhook.owner_id, event.idempotency_key())
            .await?
        {
            return self.replay(&webhook, &event, previous).await;
        }

        counter!("orderbridge_inbound_events_total", "outcome" => "accepted").increment(1);
        info!(
            "Accepted {} event {} from {} via webhook {}",
            event.event_type(),
            event.native_event_id(),
            event.source_provider(),
            webhook.id
        );

        let order = self.ingestion.ingest(webhook.owner_id, &event).await?;

        let reconciliation = if webhook.source_type == EndpointType::Delivery {
            self.reconciler.reconcile(&webhook, &event).await?
        } else {
            None
        };

        let jobs = self.router.route(webhook.owner_id, &event).await?;

        if jobs.is_empty() && reconciliation.is_none() {
            debug!("No subscription for event {}", event.idempotency_key());
            let log = WebhookLog::for_event(&webhook, &event, LogStatus::Success)
                .with_request(request.body_text())
                .with_note(NO_SUBSCRIPTION_NOTE);
            self.logs.append(&log).await?;
        }

        Ok(InboundAck {
            replay: false,
            idempotency_key: event.idempotency_key().to_string(),
            event_type: event.event_type().to_string(),
            order_id: order.map(|o| o.id),
            reconciliation,
            jobs,
            previous_response: None,
        })
    }

    fn decode(
        &self,
        webhook: &WebhookDefinition,
        request: &InboundRequest,
    ) -> Result<DomainEvent, BridgeError> {
        let decoder = self
            .decoders
            .get(webhook.source_type, &webhook.source_provider)
            .ok_or_else(|| BridgeError::UnsupportedProvider {
                endpoint_type: webhook.source_type,
                provider: webhook.source_provider.clone(),
            })?;

        if let Some(secret) = self
            .signing_secrets
            .get(&normalize_provider(&webhook.source_provider))
        {
            decoder.verify_signature(request, secret)?;
        }

        Ok(decoder.decode(request)?)
    }

    async fn replay(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        previous: WebhookLog,
    ) -> Result<InboundAck, BridgeError> {
        counter!("orderbridge_inbound_events_total", "outcome" => "replay").increment(1);
        info!(
            "Replaying event {} (first handled in log {})",
            event.idempotency_key(),
            previous.id
        );

        let mut log = WebhookLog::for_event(webhook, event, LogStatus::Success)
            .with_response(previous.response_status, previous.response_body.clone())
            .with_note(REPLAY_NOTE);
        log.replay_of = Some(previous.id);
        self.logs.append(&log).await?;

        let previous_response = previous.response_body.as_deref().map(|body| {
            serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
        });

        Ok(InboundAck {
            replay: true,
            idempotency_key: event.idempotency_key().to_string(),
            event_type: event.event_type().to_string(),
            order_id: None,
            reconciliation: None,
            jobs: Vec::new(),
            previous_response,
        })
    }
}
