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

use crate::decoders::traits::InboundRequest;
use crate::domain::services::receiver::{InboundAck, WebhookReceiver};
use crate::presentation::errors::AppError;
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

/// 接收服务商回调
///
/// `POST /api/webhook/{secret_key}`
pub async fn receive_webhook(
    Extension(receiver): Extension<Arc<WebhookReceiver>>,
    Path(secret_key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InboundAck>, AppError> {
    let headers = headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|value| (name.as_str().to_string(), value.to_string()))
    });
    let request = InboundRequest::new(headers, body.to_vec());

    let ack = receiver.receive(&secret_key, request).await?;
    Ok(Json(ack))
}
