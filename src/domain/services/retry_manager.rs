// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::errors::BridgeError;
use crate::domain::models::dispatch_job::{DispatchJob, DispatchJobStatus};
use crate::domain::models::event::DomainEvent;
use crate::domain::models::order::{FulfillmentStatus, OrderStatusChange};
use crate::domain::models::webhook::{EndpointType, WebhookDefinition};
use crate::domain::repositories::dispatch_job_repository::DispatchJobRepository;
use crate::domain::repositories::order_repository::OrderRepository;
use crate::utils::errors::RepositoryError;
use crate::utils::retry_policy::RetryPolicy;
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 重试决策
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// 已安排下一次尝试
    Scheduled {
        job_id: Uuid,
        next_retry_at: DateTime<Utc>,
    },
    /// 尝试次数耗尽，任务已标记为死亡
    Exhausted { job_id: Uuid },
}

/// 重试管理器
///
/// 瞬时失败的任务以 [`DispatchJob`] 的形式持久化，按指数退避加抖动重新调度；
/// 超过最大尝试次数后标记为死亡，并将配送目标对应的订单置为 `dispatch_failed`。
pub struct RetryManager {
    jobs: Arc<dyn DispatchJobRepository>,
    orders: Arc<dyn OrderRepository>,
    policy: RetryPolicy,
}

impl RetryManager {
    pub fn new(
        jobs: Arc<dyn DispatchJobRepository>,
        orders: Arc<dyn OrderRepository>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            jobs,
            orders,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 首次瞬时失败后登记任务
    ///
    /// 同一 Webhook 与幂等键已有任务时沿用已有任务，不重复登记。
    pub async fn schedule(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
        attempt: u32,
        error: &str,
    ) -> Result<RetryDecision, BridgeError> {
        if let Some(existing) = self
            .jobs
            .find_by_key(webhook.owner_id, webhook.id, event.idempotency_key())
            .await?
        {
            return Ok(self.decision_for(&existing));
        }

        let mut job = DispatchJob::new(
            webhook.owner_id,
            webhook.id,
            event.clone(),
            attempt,
            self.policy.max_attempts,
        );
        job.last_error = Some(error.to_string());

        if !self.policy.should_retry(attempt) {
            job.status = DispatchJobStatus::Dead;
            let job = self.jobs.create(&job).await?;
            self.exhaust(webhook.destination_type, &job).await?;
            return Ok(RetryDecision::Exhausted { job_id: job.id });
        }

        job.next_retry_at = Some(self.policy.next_retry_time(attempt, Utc::now()));
        match self.jobs.create(&job).await {
            Ok(job) => {
                counter!("orderbridge_retries_scheduled_total").increment(1);
                info!(
                    "Scheduled retry {} for webhook {} at {:?}",
                    job.id, webhook.id, job.next_retry_at
                );
                Ok(self.decision_for(&job))
            }
            // a concurrent redelivery registered the job first
            Err(RepositoryError::AlreadyExists) => {
                let existing = self
                    .jobs
                    .find_by_key(webhook.owner_id, webhook.id, event.idempotency_key())
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok(self.decision_for(&existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 记录一次失败的重试并决定下一步
    pub async fn record_failure(
        &self,
        mut job: DispatchJob,
        destination_type: EndpointType,
        attempt: u32,
        error: &str,
        transient: bool,
    ) -> Result<RetryDecision, BridgeError> {
        job.attempt_count = attempt as i32;
        job.last_error = Some(error.to_string());
        job.updated_at = Utc::now();

        let max_attempts = job.max_attempts.max(1) as u32;
        if transient && attempt < max_attempts {
            let next_retry_at = self.policy.next_retry_time(attempt, Utc::now());
            job.next_retry_at = Some(next_retry_at);
            let job = self.jobs.update(&job).await?;
            counter!("orderbridge_retries_scheduled_total").increment(1);
            return Ok(RetryDecision::Scheduled {
                job_id: job.id,
                next_retry_at,
            });
        }

        job.status = DispatchJobStatus::Dead;
        job.next_retry_at = None;
        let job = self.jobs.update(&job).await?;
        self.exhaust(destination_type, &job).await?;
        Ok(RetryDecision::Exhausted { job_id: job.id })
    }

    /// 标记任务成功
    pub async fn mark_succeeded(
        &self,
        mut job: DispatchJob,
        attempt: Option<u32>,
    ) -> Result<DispatchJob, BridgeError> {
        if let Some(attempt) = attempt {
            job.attempt_count = attempt as i32;
        }
        job.status = DispatchJobStatus::Succeeded;
        job.next_retry_at = None;
        job.updated_at = Utc::now();
        Ok(self.jobs.update(&job).await?)
    }

    /// 直接放弃任务（例如定义已被删除或停用）
    pub async fn abandon(&self, mut job: DispatchJob, reason: &str) -> Result<DispatchJob, BridgeError> {
        warn!("Abandoning dispatch job {}: {}", job.id, reason);
        job.status = DispatchJobStatus::Dead;
        job.next_retry_at = None;
        job.last_error = Some(reason.to_string());
        job.updated_at = Utc::now();
        counter!("orderbridge_dead_jobs_total").increment(1);
        Ok(self.jobs.update(&job).await?)
    }

    fn decision_for(&self, job: &DispatchJob) -> RetryDecision {
        match (job.status, job.next_retry_at) {
            (DispatchJobStatus::Pending, Some(next_retry_at)) => RetryDecision::Scheduled {
                job_id: job.id,
                next_retry_at,
            },
            (DispatchJobStatus::Pending, None) => RetryDecision::Scheduled {
                job_id: job.id,
                next_retry_at: job.updated_at,
            },
            _ => RetryDecision::Exhausted { job_id: job.id },
        }
    }

    async fn exhaust(
        &self,
        destination_type: EndpointType,
        job: &DispatchJob,
    ) -> Result<(), BridgeError> {
        counter!("orderbridge_dead_jobs_total").increment(1);
        warn!(
            "Dispatch job {} for webhook {} is dead after {} attempts: {}",
            job.id,
            job.webhook_id,
            job.attempt_count,
            job.last_error.as_deref().unwrap_or("unknown error")
        );

        if destination_type != EndpointType::Delivery {
            return Ok(());
        }
        let Some(payload) = job.event.order() else {
            return Ok(());
        };
        if let Some(order) = self
            .orders
            .find_by_number(job.owner_id, &payload.order_number)
            .await?
        {
            let change = OrderStatusChange {
                status: None,
                fulfillment_status: FulfillmentStatus::DispatchFailed,
            };
            self.orders.update_status(job.owner_id, order.id, change).await?;
        }
        Ok(())
    }
}
