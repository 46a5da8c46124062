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

use super::{from_json, from_json_opt, to_json};
use crate::domain::models::webhook::{WebhookDefinition, WebhookFilter};
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaEndpointType;
use crate::infrastructure::database::entities::webhook;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// Webhook定义仓库实现
#[derive(Clone)]
pub struct WebhookRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl WebhookRepoImpl {
    /// 创建新的Webhook仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<webhook::Model>, RepositoryError> {
        Ok(webhook::Entity::find_by_id(id)
            .filter(webhook::Column::OwnerId.eq(owner_id))
            .one(self.db.as_ref())
            .await?)
    }
}

fn to_active_model(def: &WebhookDefinition) -> Result<webhook::ActiveModel, RepositoryError> {
    Ok(webhook::ActiveModel {
        id: Set(def.id),
        owner_id: Set(def.owner_id),
        name: Set(def.name.clone()),
        description: Set(def.description.clone()),
        source_type: Set(def.source_type.into()),
        source_provider: Set(def.source_provider.clone()),
        destination_type: Set(def.destination_type.into()),
        destination_provider: Set(def.destination_provider.clone()),
        endpoint_url: Set(def.endpoint_url.clone()),
        secret_key: Set(def.secret_key.clone()),
        event_types: Set(to_json(&def.event_types)?),
        is_active: Set(def.is_active),
        pickup: Set(def.pickup.as_ref().map(to_json).transpose()?),
        created_at: Set(def.created_at.into()),
        updated_at: Set(def.updated_at.into()),
    })
}

impl TryFrom<webhook::Model> for WebhookDefinition {
    type Error = RepositoryError;

    fn try_from(model: webhook::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            description: model.description,
            source_type: model.source_type.into(),
            source_provider: model.source_provider,
            destination_type: model.destination_type.into(),
            destination_provider: model.destination_provider,
            endpoint_url: model.endpoint_url,
            secret_key: model.secret_key,
            event_types: from_json(model.event_types)?,
            is_active: model.is_active,
            pickup: from_json_opt(model.pickup)?,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

#[async_trait]
impl WebhookRepository for WebhookRepoImpl {
    async fn create(&self, def: &WebhookDefinition) -> Result<WebhookDefinition, RepositoryError> {
        webhook::Entity::insert(to_active_model(def)?)
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::from_insert)?;

        Ok(def.clone())
    }

    async fn find_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WebhookDefinition>, RepositoryError> {
        self.find_model(owner_id, id)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_secret(
        &self,
        secret_key: &str,
    ) -> Result<Option<WebhookDefinition>, RepositoryError> {
        webhook::Entity::find()
            .filter(webhook::Column::SecretKey.eq(secret_key))
            .one(self.db.as_ref())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list(
        &self,
        owner_id: Uuid,
        filter: WebhookFilter,
    ) -> Result<Vec<WebhookDefinition>, RepositoryError> {
        let mut query = webhook::Entity::find().filter(webhook::Column::OwnerId.eq(owner_id));

        if let Some(source_type) = filter.source_type {
            query = query.filter(webhook::Column::SourceType.eq(SeaEndpointType::from(source_type)));
        }
        if let Some(destination_type) = filter.destination_type {
            query = query.filter(
                webhook::Column::DestinationType.eq(SeaEndpointType::from(destination_type)),
            );
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(webhook::Column::IsActive.eq(is_active));
        }

        query
            .order_by_asc(webhook::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn update(&self, def: &WebhookDefinition) -> Result<WebhookDefinition, RepositoryError> {
        if self.find_model(def.owner_id, def.id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let mut active = to_active_model(def)?;
        // 密钥与创建时间不可修改
        active.secret_key = NotSet;
        active.created_at = NotSet;

        let updated = active.update(self.db.as_ref()).await?;
        updated.try_into()
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let result = webhook::Entity::delete_many()
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::OwnerId.eq(owner_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}
