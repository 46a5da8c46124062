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

use crate::domain::models::dispatch_job::DispatchJob;
use crate::domain::repositories::dispatch_job_repository::DispatchJobRepository;
use crate::domain::repositories::webhook_log_repository::WebhookLogRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::event_router::EventRouter;
use crate::domain::services::retry_manager::{RetryDecision, RetryManager};
use chrono::Utc;
use futures::StreamExt;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 重试工作器配置
#[derive(Debug, Clone)]
pub struct RetryWorkerConfig {
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 每批任务数
    pub batch_size: u64,
    /// 批内并发度
    pub concurrency: usize,
}

/// 重试工作器
///
/// 定期拉取到期的派发任务并以有限并发重新执行。
#[derive(Clone)]
pub struct RetryWorker {
    jobs: Arc<dyn DispatchJobRepository>,
    webhooks: Arc<dyn WebhookRepository>,
    logs: Arc<dyn WebhookLogRepository>,
    router: Arc<EventRouter>,
    retry: Arc<RetryManager>,
    config: RetryWorkerConfig,
}

impl RetryWorker {
    /// 创建新的重试工作器实例
    pub fn new(
        jobs: Arc<dyn DispatchJobRepository>,
        webhooks: Arc<dyn WebhookRepository>,
        logs: Arc<dyn WebhookLogRepository>,
        router: Arc<EventRouter>,
        retry: Arc<RetryManager>,
        config: RetryWorkerConfig,
    ) -> Self {
        Self {
            jobs,
            webhooks,
            logs,
            router,
            retry,
            config,
        }
    }

    /// 运行重试工作器
    ///
    /// 启动处理循环，直到关闭信号变为 `true`
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Retry worker started");
        loop {
            if let Err(e) = self.process_due_jobs().await {
                error!("Error processing dispatch jobs: {}", e);
            }
            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Retry worker stopped");
    }

    /// 处理到期的派发任务
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 本批处理的任务数
    /// * `Err(anyhow::Error)` - 拉取任务失败
    pub async fn process_due_jobs(&self) -> anyhow::Result<usize> {
        let jobs = self.jobs.find_due(Utc::now(), self.config.batch_size).await?;
        if jobs.is_empty() {
            return Ok(0);
        }

        let count = jobs.len();
        info!("Processing {} due dispatch jobs", count);

        let worker = self;
        futures::stream::iter(jobs)
            .for_each_concurrent(self.config.concurrency.max(1), |job| {
                let w = worker;
                async move {
                    let job_id = job.id;
                    if let Err(e) = w.process_job(job).await {
                        error!("Failed to process dispatch job {}: {}", job_id, e);
                    }
                }
            })
            .await;

        Ok(count)
    }

    async fn process_job(&self, job: DispatchJob) -> anyhow::Result<()> {
        // a provider redelivery may already have completed this work
        if self
            .logs
            .find_success_for_webhook(job.owner_id, job.webhook_id, &job.idempotency_key)
            .await?
            .is_some()
        {
            info!("Dispatch job {} already satisfied, closing", job.id);
            self.retry.mark_succeeded(job, None).await?;
            return Ok(());
        }

        let webhook = match self.webhooks.find_by_id(job.owner_id, job.webhook_id).await? {
            Some(def) if def.is_active => def,
            _ => {
                self.retry.abandon(job, "webhook deleted or inactive").await?;
                return Ok(());
            }
        };

        let attempt = job.next_attempt();
        counter!("orderbridge_retry_attempts_total").increment(1);

        match self.router.execute_job(&webhook, &job.event, attempt).await {
            Ok(()) => {
                info!("Dispatch job {} succeeded on attempt {}", job.id, attempt);
                self.retry.mark_succeeded(job, Some(attempt)).await?;
            }
            Err(e) => {
                let decision = self
                    .retry
                    .record_failure(
                        job,
                        webhook.destination_type,
                        attempt,
                        &e.to_string(),
                        e.is_transient(),
                    )
                    .await?;
                if let RetryDecision::Scheduled { job_id, next_retry_at } = decision {
                    warn!(
                        "Dispatch job {} failed on attempt {}, next retry at {}",
                        job_id, attempt, next_retry_at
                    );
                }
            }
        }
        Ok(())
    }
}
