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

use crate::application::dto::webhook_request::{
    parse_endpoint_type, CreateWebhookRequestDto, LogQueryDto, UpdateWebhookRequestDto,
    WebhookListQueryDto,
};
use crate::domain::models::webhook::{NewWebhook, WebhookDefinition, WebhookFilter, WebhookPatch};
use crate::domain::models::webhook_log::WebhookLog;
use crate::domain::services::webhook_registry::WebhookRegistry;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::owner_id::OwnerId;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub async fn create_webhook(
    Extension(registry): Extension<Arc<WebhookRegistry>>,
    OwnerId(owner_id): OwnerId,
    Json(payload): Json<CreateWebhookRequestDto>,
) -> Result<(StatusCode, Json<WebhookDefinition>), AppError> {
    payload.validate()?;
    let new = NewWebhook::try_from(payload)?;
    let webhook = registry.create(owner_id, new).await?;
    Ok((StatusCode::CREATED, Json(webhook)))
}

pub async fn list_webhooks(
    Extension(registry): Extension<Arc<WebhookRegistry>>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<WebhookListQueryDto>,
) -> Result<Json<Vec<WebhookDefinition>>, AppError> {
    let filter = WebhookFilter {
        source_type: query
            .source_type
            .as_deref()
            .map(|s| parse_endpoint_type("source_type", s))
            .transpose()?,
        destination_type: query
            .destination_type
            .as_deref()
            .map(|s| parse_endpoint_type("destination_type", s))
            .transpose()?,
        is_active: query.is_active,
    };
    Ok(Json(registry.list(owner_id, filter).await?))
}

pub async fn get_webhook(
    Extension(registry): Extension<Arc<WebhookRegistry>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookDefinition>, AppError> {
    Ok(Json(registry.get(owner_id, id).await?))
}

pub async fn update_webhook(
    Extension(registry): Extension<Arc<WebhookRegistry>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWebhookRequestDto>,
) -> Result<Json<WebhookDefinition>, AppError> {
    payload.validate()?;
    let patch = WebhookPatch::try_from(payload)?;
    Ok(Json(registry.update(owner_id, id, patch).await?))
}

pub async fn delete_webhook(
    Extension(registry): Extension<Arc<WebhookRegistry>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    registry.delete(owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 按时间倒序返回最近的处理日志
pub async fn list_webhook_logs(
    Extension(registry): Extension<Arc<WebhookRegistry>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Query(query): Query<LogQueryDto>,
) -> Result<Json<Vec<WebhookLog>>, AppError> {
    Ok(Json(registry.logs(owner_id, id, query.limit).await?))
}
