// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    create_test_app, create_test_app_with, shopify_order, shopify_request,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use orderbridge::decoders::traits::InboundRequest;
use orderbridge::domain::errors::BridgeError;
use orderbridge::domain::models::webhook::{EndpointType, WebhookPatch};
use orderbridge::domain::models::webhook_log::LogStatus;
use orderbridge::domain::services::event_router::JobStatus;
use orderbridge::domain::services::receiver::{NO_SUBSCRIPTION_NOTE, REPLAY_NOTE};
use orderbridge::providers::traits::ProviderError;
use sha2::Sha256;
use std::collections::HashMap;

/// 重复投递只产生一次副作用，但每次投递都有日志
#[tokio::test]
async fn test_duplicate_delivery_is_replayed() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    let request = shopify_request("orders/create", "evt-dup", &shopify_order("#1101"));

    let first = app
        .receiver
        .receive(&webhook.secret_key, request.clone())
        .await
        .unwrap();
    let second = app
        .receiver
        .receive(&webhook.secret_key, request)
        .await
        .unwrap();

    assert!(!first.replay);
    assert!(second.replay);
    assert_eq!(first.idempotency_key, second.idempotency_key);
    assert!(second.jobs.is_empty());
    let previous = second.previous_response.expect("original response is returned");
    assert_eq!(previous["external_id"], "del_1");
    assert_eq!(app.provider.calls(), 1);

    let logs = app.logs_for(webhook.id).await;
    assert_eq!(logs.len(), 2);
    let original = logs.iter().find(|l| !l.is_replay()).unwrap();
    let replay = logs.iter().find(|l| l.is_replay()).unwrap();
    assert_eq!(replay.replay_of, Some(original.id));
    assert_eq!(replay.note.as_deref(), Some(REPLAY_NOTE));
    assert_eq!(replay.status, LogStatus::Success);
    assert_eq!(replay.response_body, original.response_body);
}

/// 并发的重复投递同样只处理一次
#[tokio::test]
async fn test_concurrent_duplicates_are_serialized() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    let request = shopify_request("orders/create", "evt-race", &shopify_order("#1102"));

    let (a, b) = tokio::join!(
        app.receiver.receive(&webhook.secret_key, request.clone()),
        app.receiver.receive(&webhook.secret_key, request.clone()),
    );
    let replays = [a.unwrap().replay, b.unwrap().replay];
    assert_eq!(replays.iter().filter(|r| **r).count(), 1);
    assert_eq!(app.provider.calls(), 1);
}

/// 没有订阅的事件记录一条成功日志
#[tokio::test]
async fn test_event_without_subscription_is_logged() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;

    let ack = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/updated", "evt-upd", &shopify_order("#1103")),
        )
        .await
        .unwrap();

    assert_eq!(ack.event_type, "order.updated");
    assert!(ack.jobs.is_empty());
    assert!(ack.order_id.is_some());
    assert_eq!(app.provider.calls(), 0);

    let logs = app.logs_for(webhook.id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Success);
    assert_eq!(logs[0].note.as_deref(), Some(NO_SUBSCRIPTION_NOTE));
}

/// 未知或已停用的密钥视为未认证
#[tokio::test]
async fn test_unknown_or_inactive_secret_is_rejected() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    let request = shopify_request("orders/create", "evt-auth", &shopify_order("#1104"));

    let err = app
        .receiver
        .receive("0000", request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Authentication));

    app.registry
        .update(
            app.owner_id,
            webhook.id,
            WebhookPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = app
        .receiver
        .receive(&webhook.secret_key, request)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Authentication));

    assert_eq!(app.provider.calls(), 0);
    assert!(app.logs_for(webhook.id).await.is_empty());
}

/// 无法解析的负载返回解码错误并记录失败日志
#[tokio::test]
async fn test_malformed_payload_is_logged() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    let request = InboundRequest::new(
        [
            ("X-Shopify-Topic", "orders/create"),
            ("X-Shopify-Webhook-Id", "evt-bad"),
        ],
        b"{not json".to_vec(),
    );

    let err = app
        .receiver
        .receive(&webhook.secret_key, request)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode(_)));

    let logs = app.logs_for(webhook.id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Failed);
    assert_eq!(logs[0].request_body.as_deref(), Some("{not json"));
}

/// 配置签名密钥后必须携带有效签名
#[tokio::test]
async fn test_signature_is_enforced_when_configured() {
    let secrets = HashMap::from([("Shopify".to_string(), "shpss_secret".to_string())]);
    let app = create_test_app_with(secrets, 4).await;
    let webhook = app.shopify_to_delivery().await;
    let body = serde_json::to_vec(&shopify_order("#1105")).unwrap();

    let unsigned = InboundRequest::new(
        [
            ("X-Shopify-Topic", "orders/create".to_string()),
            ("X-Shopify-Webhook-Id", "evt-signed".to_string()),
        ],
        body.clone(),
    );
    let err = app
        .receiver
        .receive(&webhook.secret_key, unsigned)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Authentication));

    let mut mac = Hmac::<Sha256>::new_from_slice(b"shpss_secret").unwrap();
    mac.update(&body);
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    let signed = InboundRequest::new(
        [
            ("X-Shopify-Topic", "orders/create".to_string()),
            ("X-Shopify-Webhook-Id", "evt-signed".to_string()),
            ("X-Shopify-Hmac-Sha256", signature),
        ],
        body,
    );
    let ack = app
        .receiver
        .receive(&webhook.secret_key, signed)
        .await
        .unwrap();
    assert_eq!(ack.jobs[0].status, JobStatus::Succeeded);
}

/// 扇出任务互相独立：一个失败不影响其他任务
#[tokio::test]
async fn test_fan_out_failures_are_independent() {
    let app = create_test_app().await;
    let delivery = app.shopify_to_delivery().await;
    let failing = app.shopify_forward("https://erp.example/rejects").await;
    let healthy = app.shopify_forward("https://crm.example/orders").await;
    app.forwarder.fail_url(
        &failing.endpoint_url,
        ProviderError::Permanent {
            status: Some(400),
            message: "bad request".to_string(),
        },
        1,
    );

    let ack = app
        .receiver
        .receive(
            &delivery.secret_key,
            shopify_request("orders/create", "evt-fan", &shopify_order("#1106")),
        )
        .await
        .unwrap();
    assert_eq!(ack.jobs.len(), 3);

    let status_of = |id| {
        ack.jobs
            .iter()
            .find(|j| j.webhook_id == id)
            .map(|j| j.status.clone())
            .unwrap()
    };
    assert_eq!(status_of(delivery.id), JobStatus::Succeeded);
    assert_eq!(status_of(healthy.id), JobStatus::Succeeded);
    assert!(matches!(status_of(failing.id), JobStatus::Failed { .. }));
    assert_eq!(
        ack.jobs
            .iter()
            .filter(|j| j.destination_type == EndpointType::Ecommerce)
            .count(),
        2
    );

    assert_eq!(app.provider.calls(), 1);
    assert_eq!(
        app.forwarder.forwarded(),
        vec![(healthy.id, ack.idempotency_key.clone())]
    );

    let failed_logs = app.logs_for(failing.id).await;
    assert_eq!(failed_logs.len(), 1);
    assert_eq!(failed_logs[0].status, LogStatus::Failed);
    assert_eq!(failed_logs[0].response_status, Some(400));
    assert_eq!(app.logs_for(healthy.id).await.len(), 1);
    assert_eq!(app.logs_for(delivery.id).await.len(), 1);
}
