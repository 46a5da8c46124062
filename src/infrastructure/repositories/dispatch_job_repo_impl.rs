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

use super::{from_json, to_json};
use crate::domain::models::dispatch_job::DispatchJob;
use crate::domain::repositories::dispatch_job_repository::DispatchJobRepository;
use crate::infrastructure::database::entities::dispatch_job;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaDispatchJobStatus;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 派发任务仓库实现
#[derive(Clone)]
pub struct DispatchJobRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DispatchJobRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_active_model(job: &DispatchJob) -> Result<dispatch_job::ActiveModel, RepositoryError> {
    Ok(dispatch_job::ActiveModel {
        id: Set(job.id),
        owner_id: Set(job.owner_id),
        webhook_id: Set(job.webhook_id),
        idempotency_key: Set(job.idempotency_key.clone()),
        event: Set(to_json(&job.event)?),
        status: Set(job.status.into()),
        attempt_count: Set(job.attempt_count),
        max_attempts: Set(job.max_attempts),
        next_retry_at: Set(job.next_retry_at.map(Into::into)),
        last_error: Set(job.last_error.clone()),
        created_at: Set(job.created_at.into()),
        updated_at: Set(job.updated_at.into()),
    })
}

impl TryFrom<dispatch_job::Model> for DispatchJob {
    type Error = RepositoryError;

    fn try_from(model: dispatch_job::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            webhook_id: model.webhook_id,
            idempotency_key: model.idempotency_key,
            event: from_json(model.event)?,
            status: model.status.into(),
            attempt_count: model.attempt_count,
            max_attempts: model.max_attempts,
            next_retry_at: model.next_retry_at.map(Into::into),
            last_error: model.last_error,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

#[async_trait]
impl DispatchJobRepository for DispatchJobRepositoryImpl {
    async fn create(&self, job: &DispatchJob) -> Result<DispatchJob, RepositoryError> {
        dispatch_job::Entity::insert(to_active_model(job)?)
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::from_insert)?;

        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DispatchJob>, RepositoryError> {
        dispatch_job::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_key(
        &self,
        owner_id: Uuid,
        webhook_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<DispatchJob>, RepositoryError> {
        dispatch_job::Entity::find()
            .filter(dispatch_job::Column::OwnerId.eq(owner_id))
            .filter(dispatch_job::Column::WebhookId.eq(webhook_id))
            .filter(dispatch_job::Column::IdempotencyKey.eq(idempotency_key))
            .one(self.db.as_ref())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<DispatchJob>, RepositoryError> {
        let now: DateTimeWithTimeZone = now.into();
        dispatch_job::Entity::find()
            .filter(dispatch_job::Column::Status.eq(SeaDispatchJobStatus::Pending))
            .filter(dispatch_job::Column::NextRetryAt.lte(now))
            .order_by_asc(dispatch_job::Column::NextRetryAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn update(&self, job: &DispatchJob) -> Result<DispatchJob, RepositoryError> {
        if dispatch_job::Entity::find_by_id(job.id)
            .one(self.db.as_ref())
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        let mut active = to_active_model(job)?;
        active.created_at = NotSet;

        let updated = active.update(self.db.as_ref()).await?;
        updated.try_into()
    }
}
