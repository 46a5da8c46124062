// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::event::DomainEvent;
use crate::domain::models::webhook::{EndpointType, WebhookDefinition, WebhookFilter};
use crate::domain::models::webhook_log::{LogStatus, WebhookLog};
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::delivery_dispatcher::DeliveryDispatcher;
use crate::domain::services::retry_manager::{RetryDecision, RetryManager};
use crate::providers::traits::EventForwarder;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// 单个派发任务的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub webhook_id: Uuid,
    pub destination_type: EndpointType,
    pub destination_provider: String,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// 派发任务状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// 首次尝试即成功
    Succeeded,
    /// 瞬时失败，已交给重试管理器
    RetryScheduled {
        job_id: Uuid,
        next_retry_at: DateTime<Utc>,
    },
    /// 永久失败或重试耗尽
    Failed { error: String },
}

/// 事件路由器
///
/// 将领域事件与租户下所有已启用的定义匹配并扇出执行。
/// 每个任务独立执行、独立记录结果，一个任务失败不会阻塞其他任务。
pub struct EventRouter {
    webhooks: Arc<dyn WebhookRepository>,
    logs: Arc<dyn WebhookLogRepository>,
    dispatcher: Arc<DeliveryDispatcher>,
    forwarder: Arc<dyn EventForwarder>,
    retry: Arc<RetryManager>,
}

impl EventRouter {
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        logs: Arc<dyn WebhookLogRepository>,
        dispatcher: Arc<DeliveryDispatcher>,
        forwarder: Arc<dyn EventForwarder>,
        retry: Arc<RetryManager>,
    ) -> Self {
        Self {
            webhooks,
            logs,
            dispatcher,
            forwarder,
            retry,
        }
    }

    /// 查找匹配事件的定义
    pub async fn matching(
        &self,
        owner_id: Uuid,
        event: &DomainEvent,
    ) -> Result<Vec<WebhookDefinition>, BridgeError> {
        let filter = WebhookFilter {
            is_active: Some(true),
            ..WebhookFilter::default()
        };
        let definitions = self.webhooks.list(owner_id, filter).await?;
        Ok(definitions
            .into_iter()
            .filter(|def| def.matches(event))
            .collect())
    }

    /// 路由事件并并发执行所有匹配的任务
    pub async fn route(
        &self,
        owner_id: Uuid,
        event: &DomainEvent,
    ) -> Result<Vec<JobResult>, BridgeError> {
        let matches = self.matching(owner_id, event).await?;
        debug!(
            "Event {} ({}) matched {} webhook(s)",
            event.idempotency_key(),
            event.event_type(),
            matches.len()
        );

        let results = join_all(matches.iter().map(|def| self.run_first_attempt(def, event))).await;
        Ok(results)
    }

    async fn run_first_attempt(&self, webhook: &WebhookDefinition, event: &DomainEvent) -> JobResult {
        let status = match self.execute_job(webhook, event, 1).await {
            Ok(()) => JobStatus::Succeeded,
            Err(e) if e.is_transient() => {
                match self.retry.schedule(webhook, event, 1, &e.to_string()).await {
                    Ok(RetryDecision::Scheduled {
                        job_id,
                        next_retry_at,
                    }) => JobStatus::RetryScheduled {
                        job_id,
                        next_retry_at,
                    },
                    Ok(RetryDecision::Exhausted { .. }) => JobStatus::Failed {
                        error: e.to_string(),
                    },
                    Err(schedule_error) => {
                        error!(
                            "Failed to schedule retry for webhook {}: {}",
                            webhook.id, schedule_error
                        );
                        JobStatus::Failed {
                            error: schedule_error.to_string(),
                        }
                    }
                }
            }
            Err(e) => JobStatus::Failed {
                error: e.to_string(),
            },
        };

        JobResult {
            webhook_id: webhook.id,
            destination_type: webhook.destination_type,
            destination_provider: webhook.destination_provider.clone(),
            status,
        }
    }

    /// 对单个定义执行一次尝试
    ///
    /// 首次派发与后台重试共用此入口；每次尝试都会写入一条日志。
    pub async fn execute_job(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        attempt: u32,
    ) -> Result<(), BridgeError> {
        match webhook.destination_type {
            EndpointType::Delivery => {
                self.dispatcher.dispatch(webhook, event, attempt).await?;
                Ok(())
            }
            EndpointType::Ecommerce => self.forward(webhook, event, attempt).await,
        }
    }

    async fn forward(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        attempt: u32,
    ) -> Result<(), BridgeError> {
        let base = WebhookLog::for_event(webhook, event, LogStatus::Success)
            .with_attempt(attempt)
            .with_request_body(serde_json::to_string(event).ok());

        match self.forwarder.forward(webhook, event).await {
            Ok(response) => {
                counter!("orderbridge_forward_total", "outcome" => "success").increment(1);
                let log = base.with_response(Some(i32::from(response.status)), response.body);
                self.logs.append(&log).await?;
                Ok(())
            }
            Err(e) => {
                let outcome = if e.is_transient() { "transient" } else { "permanent" };
                counter!("orderbridge_forward_total", "outcome" => outcome).increment(1);
                warn!(
                    "Forwarding {} to {} failed (attempt {}): {}",
                    event.event_type(),
                    webhook.endpoint_url,
                    attempt,
                    e
                );
                let log = base
                    .with_response(e.status().map(i32::from), None)
                    .with_error(e.to_string());
                self.logs.append(&log).await?;
                Err(e.into())
            }
        }
    }
}
