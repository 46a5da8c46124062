// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::dispatch_job::DispatchJob;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 派发任务仓库特质
#[async_trait]
pub trait DispatchJobRepository: Send + Sync {
    /// 创建任务，同一 Webhook 与幂等键已有任务时返回 `AlreadyExists`
    async fn create(&self, job: &DispatchJob) -> Result<DispatchJob, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DispatchJob>, RepositoryError>;
    /// 查找某个Webhook在幂等键下的任务
    async fn find_by_key(
        &self,
        owner_id: Uuid,
        webhook_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<DispatchJob>, RepositoryError>;
    /// 查找到期的待重试任务
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<DispatchJob>, RepositoryError>;
    /// 更新任务调度状态
    async fn update(&self, job: &DispatchJob) -> Result<DispatchJob, RepositoryError>;
}
