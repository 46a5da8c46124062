// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DeliveryAccountSettings;
use crate::domain::models::delivery::DeliveryStatus;
use crate::domain::services::status_reconciler::map_provider_status;
use crate::providers::traits::{
    CreateDeliveryRequest, CreateDeliveryResponse, DeliveryProvider, ProviderError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// 基于HTTP的配送服务商客户端
///
/// 向 `{base_url}/deliveries` 提交JSON请求，并携带 `Idempotency-Key` 头，
/// 使服务商侧也能对重试去重。
pub struct HttpDeliveryProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct DeliveryResponseBody {
    id: String,
    status: Option<String>,
    pickup_eta: Option<DateTime<Utc>>,
    dropoff_eta: Option<DateTime<Utc>>,
    fee: Option<i64>,
    currency: Option<String>,
    tracking_url: Option<String>,
}

impl HttpDeliveryProvider {
    /// 创建新的HTTP配送服务商客户端
    ///
    /// # 参数
    ///
    /// * `account` - 服务商账户配置
    /// * `timeout` - 单次请求超时
    pub fn new(account: &DeliveryAccountSettings, timeout: Duration) -> reqwest::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("OrderBridge/0.1.0"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            name: account.name.clone(),
            base_url: account.base_url.trim_end_matches('/').to_string(),
            api_key: account.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl DeliveryProvider for HttpDeliveryProvider {
    async fn create_delivery(
        &self,
        request: &CreateDeliveryRequest,
    ) -> Result<CreateDeliveryResponse, ProviderError> {
        let url = format!("{}/deliveries", self.base_url);
        debug!("Creating {} delivery for order {}", self.name, request.order_number);

        let mut builder = self
            .client
            .post(&url)
            .header("Idempotency-Key", &request.idempotency_key)
            .json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} rejected delivery with status {}", self.name, status);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let body: DeliveryResponseBody = response.json().await?;
        let status = body
            .status
            .as_deref()
            .and_then(|raw| map_provider_status(&self.name, raw))
            .unwrap_or(DeliveryStatus::Created);

        Ok(CreateDeliveryResponse {
            external_id: body.id,
            status,
            pickup_eta: body.pickup_eta,
            dropoff_eta: body.dropoff_eta,
            fee: body.fee,
            currency: body.currency,
            tracking_url: body.tracking_url,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
