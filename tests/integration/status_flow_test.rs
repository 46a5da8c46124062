// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    create_test_app, shopify_order, shopify_request, uber_status_request, TestApp,
};
use orderbridge::domain::errors::BridgeError;
use orderbridge::domain::models::delivery::{Delivery, DeliveryStatus};
use orderbridge::domain::models::order::{FulfillmentStatus, Order, OrderStatus};
use orderbridge::domain::models::webhook::WebhookDefinition;
use orderbridge::domain::models::webhook_log::LogStatus;
use orderbridge::domain::services::event_router::JobStatus;
use orderbridge::domain::services::status_reconciler::ReconcileOutcome;

/// 派发一个订单，返回状态回调定义、订单与配送
async fn dispatched_order(app: &TestApp, order_name: &str) -> (WebhookDefinition, Order, Delivery) {
    let dispatch = app.shopify_to_delivery().await;
    let callback = app.uber_status_callback().await;
    app.receiver
        .receive(
            &dispatch.secret_key,
            shopify_request(
                "orders/create",
                &format!("evt-{}", order_name),
                &shopify_order(order_name),
            ),
        )
        .await
        .unwrap();

    let order = app
        .orders
        .find_by_number(app.owner_id, order_name.trim_start_matches('#'))
        .await
        .unwrap()
        .unwrap();
    let delivery = app
        .deliveries
        .find_active_by_order(app.owner_id, order.id)
        .await
        .unwrap()
        .unwrap();
    (callback, order, delivery)
}

async fn reload(app: &TestApp, order: &Order, delivery: &Delivery) -> (Order, Delivery) {
    let order = app
        .orders
        .find_by_id(app.owner_id, order.id)
        .await
        .unwrap()
        .unwrap();
    let delivery = app
        .deliveries
        .find_by_id(app.owner_id, delivery.id)
        .await
        .unwrap()
        .unwrap();
    (order, delivery)
}

/// 配送状态逐步前进，订单随之更新
#[tokio::test]
async fn test_status_callbacks_advance_delivery_and_order() {
    let app = create_test_app().await;
    let (callback, order, delivery) = dispatched_order(&app, "#8001").await;
    let external_id = delivery.external_id.clone().unwrap();

    let ack = app
        .receiver
        .receive(&callback.secret_key, uber_status_request("st-1", &external_id, "pickup"))
        .await
        .unwrap();
    assert_eq!(
        ack.reconciliation,
        Some(ReconcileOutcome::Applied {
            delivery_id: delivery.id,
            from: DeliveryStatus::Created,
            to: DeliveryStatus::Assigned,
        })
    );
    // not subscribed to delivery.assigned
    assert!(ack.jobs.is_empty());

    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::Assigned);
    assert!(current.current_location.is_some());
    assert_eq!(current_order.status, OrderStatus::Confirmed);
    assert_eq!(current_order.fulfillment_status, FulfillmentStatus::Dispatched);

    app.receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-2", &external_id, "pickup_complete"),
        )
        .await
        .unwrap();
    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::PickedUp);
    assert_eq!(current_order.status, OrderStatus::OutForDelivery);
    assert_eq!(current_order.fulfillment_status, FulfillmentStatus::InTransit);

    let ack = app
        .receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-3", &external_id, "delivered"),
        )
        .await
        .unwrap();
    assert_eq!(ack.jobs.len(), 1);
    assert_eq!(ack.jobs[0].status, JobStatus::Succeeded);
    assert_eq!(app.forwarder.forwarded().len(), 1);

    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::Delivered);
    assert_eq!(current_order.status, OrderStatus::Delivered);
    assert_eq!(current_order.fulfillment_status, FulfillmentStatus::Fulfilled);

    // delivered deliveries are no longer active
    assert!(app
        .deliveries
        .find_active_by_order(app.owner_id, order.id)
        .await
        .unwrap()
        .is_none());
}

/// 先到的“已送达”之后再到“已分配”，后者被忽略
#[tokio::test]
async fn test_out_of_order_callback_is_ignored() {
    let app = create_test_app().await;
    let (callback, order, delivery) = dispatched_order(&app, "#8002").await;
    let external_id = delivery.external_id.clone().unwrap();

    app.receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-delivered", &external_id, "delivered"),
        )
        .await
        .unwrap();

    let ack = app
        .receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-assigned", &external_id, "pickup"),
        )
        .await
        .unwrap();
    assert_eq!(
        ack.reconciliation,
        Some(ReconcileOutcome::Ignored {
            delivery_id: delivery.id,
            current: DeliveryStatus::Delivered,
            rejected: DeliveryStatus::Assigned,
        })
    );

    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::Delivered);
    assert_eq!(current_order.status, OrderStatus::Delivered);

    let logs = app.logs_for(callback.id).await;
    let ignored = logs
        .iter()
        .find(|l| {
            l.note
                .as_deref()
                .is_some_and(|n| n.starts_with("ignored out-of-order"))
        })
        .expect("ignored transition is logged");
    assert_eq!(ignored.status, LogStatus::Success);
}

/// 取消回调只改变履约状态，订单状态保留
#[tokio::test]
async fn test_cancelled_delivery_updates_fulfillment_only() {
    let app = create_test_app().await;
    let (callback, order, delivery) = dispatched_order(&app, "#8003").await;
    let external_id = delivery.external_id.clone().unwrap();

    app.receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-cancel", &external_id, "canceled"),
        )
        .await
        .unwrap();

    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::Cancelled);
    assert_eq!(current_order.status, OrderStatus::Confirmed);
    assert_eq!(
        current_order.fulfillment_status,
        FulfillmentStatus::DeliveryCancelled
    );
}

/// 已取消的订单在配送送达后仍保持取消状态
#[tokio::test]
async fn test_terminal_order_keeps_status() {
    let app = create_test_app().await;
    let (callback, order, delivery) = dispatched_order(&app, "#8004").await;
    let external_id = delivery.external_id.clone().unwrap();

    let shop = app
        .webhooks
        .list(app.owner_id, Default::default())
        .await
        .unwrap()
        .into_iter()
        .find(|w| w.source_provider == "shopify")
        .unwrap();
    let mut cancelled = shopify_order("#8004");
    cancelled["cancelled_at"] = serde_json::json!("2025-06-01T10:00:00Z");
    app.receiver
        .receive(
            &shop.secret_key,
            shopify_request("orders/cancelled", "evt-cancel-8004", &cancelled),
        )
        .await
        .unwrap();

    app.receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-late", &external_id, "delivered"),
        )
        .await
        .unwrap();

    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::Delivered);
    assert_eq!(current_order.status, OrderStatus::Cancelled);
    assert_eq!(current_order.fulfillment_status, FulfillmentStatus::Fulfilled);
}

/// 未知配送的回调被拒绝并记录
#[tokio::test]
async fn test_unknown_delivery_is_rejected() {
    let app = create_test_app().await;
    let callback = app.uber_status_callback().await;

    let err = app
        .receiver
        .receive(
            &callback.secret_key,
            uber_status_request("st-x", "del_missing", "pickup"),
        )
        .await
        .unwrap_err();
    match err {
        BridgeError::UnknownDelivery { provider, external_id } => {
            assert_eq!(provider, "uberdirect");
            assert_eq!(external_id, "del_missing");
        }
        other => panic!("unexpected error {:?}", other),
    }

    let logs = app.logs_for(callback.id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Failed);
}

/// 重复的状态回调只应用一次
#[tokio::test]
async fn test_duplicate_status_callback_is_replayed() {
    let app = create_test_app().await;
    let (callback, _order, delivery) = dispatched_order(&app, "#8005").await;
    let external_id = delivery.external_id.clone().unwrap();

    let first = app
        .receiver
        .receive(&callback.secret_key, uber_status_request("st-dup", &external_id, "pickup"))
        .await
        .unwrap();
    let second = app
        .receiver
        .receive(&callback.secret_key, uber_status_request("st-dup", &external_id, "pickup"))
        .await
        .unwrap();

    assert!(!first.replay);
    assert!(second.replay);
    assert_eq!(second.reconciliation, None);
    assert!(second.previous_response.is_some());

    let logs = app.logs_for(callback.id).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs.iter().filter(|l| l.is_replay()).count(), 1);
}

/// 同一配送的不同状态回调并发到达，状态只前进且每个回调各记一条日志
#[tokio::test]
async fn test_concurrent_status_callbacks_never_regress() {
    let app = create_test_app().await;
    let (callback, order, delivery) = dispatched_order(&app, "#8006").await;
    let external_id = delivery.external_id.clone().unwrap();

    let acks = futures::future::join_all(
        [
            ("st-c1", "pickup"),
            ("st-c2", "pickup_complete"),
            ("st-c3", "delivered"),
        ]
        .into_iter()
        .map(|(event_id, status)| {
            app.receiver.receive(
                &callback.secret_key,
                uber_status_request(event_id, &external_id, status),
            )
        }),
    )
    .await;

    for ack in acks {
        match ack.unwrap().reconciliation {
            Some(ReconcileOutcome::Applied { from, to, .. }) => {
                assert!(from.can_transition_to(to), "{} -> {}", from, to)
            }
            Some(ReconcileOutcome::Ignored { current, rejected, .. }) => {
                assert!(!current.can_transition_to(rejected))
            }
            None => panic!("callback was not reconciled"),
        }
    }

    let (current_order, current) = reload(&app, &order, &delivery).await;
    assert_eq!(current.status, DeliveryStatus::Delivered);
    assert_eq!(current_order.status, OrderStatus::Delivered);
    assert_eq!(current_order.fulfillment_status, FulfillmentStatus::Fulfilled);

    let reconciled = app
        .logs_for(callback.id)
        .await
        .into_iter()
        .filter(|l| l.note.as_deref().is_some_and(|n| n.contains(" -> ")))
        .count();
    assert_eq!(reconciled, 3);
}
