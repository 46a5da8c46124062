// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::receiver::WebhookReceiver;
use crate::domain::services::webhook_registry::WebhookRegistry;
use crate::presentation::handlers::{inbound_handler, webhook_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `registry` - Webhook注册表服务
/// * `receiver` - 入站Webhook接收器
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(registry: Arc<WebhookRegistry>, receiver: Arc<WebhookReceiver>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version));

    let inbound_routes = Router::new()
        .route(
            "/api/webhook/{secret_key}",
            post(inbound_handler::receive_webhook),
        )
        .layer(Extension(receiver));

    let management_routes = Router::new()
        .route(
            "/api/webhooks",
            get(webhook_handler::list_webhooks).post(webhook_handler::create_webhook),
        )
        .route(
            "/api/webhooks/{id}",
            get(webhook_handler::get_webhook)
                .patch(webhook_handler::update_webhook)
                .delete(webhook_handler::delete_webhook),
        )
        .route(
            "/api/webhooks/{id}/logs",
            get(webhook_handler::list_webhook_logs),
        )
        .layer(Extension(registry));

    Router::new()
        .merge(public_routes)
        .merge(inbound_routes)
        .merge(management_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
