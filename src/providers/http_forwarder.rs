// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::DomainEvent;
use crate::domain::models::webhook::WebhookDefinition;
use crate::providers::traits::{EventForwarder, ForwardResponse, ProviderError};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// 签名头
pub const SIGNATURE_HEADER: &str = "X-OrderBridge-Signature";
/// 时间戳头
pub const TIMESTAMP_HEADER: &str = "X-OrderBridge-Timestamp";

/// HTTP事件转发器
///
/// 以定义自身的密钥对 `"{timestamp}.{body}"` 做 HMAC-SHA256 签名后POST到目标地址。
pub struct HttpEventForwarder {
    /// HTTP 客户端
    client: reqwest::Client,
}

impl HttpEventForwarder {
    /// 创建新的转发器
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

/// 为负载生成签名
pub fn sign_payload(secret: &str, payload: &str, timestamp: i64) -> String {
    let message = format!("{}.{}", timestamp, payload);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[async_trait]
impl EventForwarder for HttpEventForwarder {
    async fn forward(
        &self,
        webhook: &WebhookDefinition,
        event: &DomainEvent,
    ) -> Result<ForwardResponse, ProviderError> {
        let timestamp = chrono::Utc::now().timestamp();
        let payload = serde_json::to_string(event).map_err(|e| ProviderError::Permanent {
            status: None,
            message: e.to_string(),
        })?;
        let signature = sign_payload(&webhook.secret_key, &payload, timestamp);

        let response = self
            .client
            .post(&webhook.endpoint_url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header("X-OrderBridge-Event", event.event_type().to_string())
            .header("X-OrderBridge-Idempotency-Key", event.idempotency_key())
            .body(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        if (200..300).contains(&status) {
            Ok(ForwardResponse { status, body })
        } else {
            Err(ProviderError::from_status(status, body.unwrap_or_default()))
        }
    }
}
