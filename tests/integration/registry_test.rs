// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, shopify_order, shopify_request};
use orderbridge::domain::errors::BridgeError;
use orderbridge::domain::models::webhook::{
    EndpointType, EventType, NewWebhook, WebhookFilter, WebhookPatch,
};
use uuid::Uuid;

fn new_webhook(name: &str, endpoint_url: &str) -> NewWebhook {
    NewWebhook {
        name: name.to_string(),
        description: Some("orders to couriers".to_string()),
        source_type: EndpointType::Ecommerce,
        source_provider: "woocommerce".to_string(),
        destination_type: EndpointType::Delivery,
        destination_provider: "doordash".to_string(),
        endpoint_url: endpoint_url.to_string(),
        event_types: vec![EventType::OrderCreated, EventType::OrderUpdated],
        is_active: true,
        pickup: None,
    }
}

#[tokio::test]
async fn test_create_generates_distinct_secrets() {
    let app = create_test_app().await;

    let a = app
        .registry
        .create(app.owner_id, new_webhook("a", "https://api.doordash.com/drive"))
        .await
        .unwrap();
    let b = app
        .registry
        .create(app.owner_id, new_webhook("b", "https://api.doordash.com/drive"))
        .await
        .unwrap();

    assert_ne!(a.secret_key, b.secret_key);
    assert_eq!(a.secret_key.len(), 64);
    assert!(a.secret_key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(a.owner_id, app.owner_id);

    let fetched = app.registry.get(app.owner_id, a.id).await.unwrap();
    assert_eq!(fetched.secret_key, a.secret_key);
    assert_eq!(fetched.event_types, vec![EventType::OrderCreated, EventType::OrderUpdated]);
    assert_eq!(fetched.description.as_deref(), Some("orders to couriers"));
}

#[tokio::test]
async fn test_create_rejects_invalid_definitions() {
    let app = create_test_app().await;

    let cases = [
        new_webhook("   ", "https://api.example.com"),
        new_webhook("bad url", "ftp://files.example.com"),
        NewWebhook {
            event_types: vec![],
            ..new_webhook("no events", "https://api.example.com")
        },
        NewWebhook {
            destination_provider: "--".to_string(),
            ..new_webhook("bad provider", "https://api.example.com")
        },
    ];
    for new in cases {
        let name = new.name.clone();
        let err = app.registry.create(app.owner_id, new).await.unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)), "{}: {:?}", name, err);
    }

    let all = app
        .registry
        .list(app.owner_id, WebhookFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_update_applies_patch_and_guards_identity() {
    let app = create_test_app().await;
    let created = app
        .registry
        .create(app.owner_id, new_webhook("orig", "https://api.doordash.com/drive"))
        .await
        .unwrap();

    let updated = app
        .registry
        .update(
            app.owner_id,
            created.id,
            WebhookPatch {
                name: Some("renamed".to_string()),
                description: Some(None),
                event_types: Some(vec![EventType::OrderCancelled]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.description, None);
    assert_eq!(updated.event_types, vec![EventType::OrderCancelled]);
    assert_eq!(updated.secret_key, created.secret_key);

    for patch in [
        WebhookPatch {
            id: Some(Uuid::new_v4()),
            ..Default::default()
        },
        WebhookPatch {
            owner_id: Some(Uuid::new_v4()),
            ..Default::default()
        },
        WebhookPatch {
            secret_key: Some("f".repeat(64)),
            ..Default::default()
        },
        WebhookPatch {
            endpoint_url: Some("not a url".to_string()),
            ..Default::default()
        },
    ] {
        let err = app
            .registry
            .update(app.owner_id, created.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)), "{:?}", err);
    }

    // echoing the current identity is accepted
    app.registry
        .update(
            app.owner_id,
            created.id,
            WebhookPatch {
                id: Some(created.id),
                secret_key: Some(created.secret_key.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_definitions_are_scoped_to_owner() {
    let app = create_test_app().await;
    let other_owner = Uuid::new_v4();
    let created = app
        .registry
        .create(app.owner_id, new_webhook("mine", "https://api.doordash.com/drive"))
        .await
        .unwrap();

    assert!(matches!(
        app.registry.get(other_owner, created.id).await,
        Err(BridgeError::NotFound(_))
    ));
    assert!(matches!(
        app.registry
            .update(other_owner, created.id, WebhookPatch::default())
            .await,
        Err(BridgeError::NotFound(_))
    ));
    assert!(matches!(
        app.registry.delete(other_owner, created.id).await,
        Err(BridgeError::NotFound(_))
    ));
    assert!(app
        .registry
        .list(other_owner, WebhookFilter::default())
        .await
        .unwrap()
        .is_empty());

    assert!(app.registry.get(app.owner_id, created.id).await.is_ok());
}

#[tokio::test]
async fn test_list_filters() {
    let app = create_test_app().await;
    app.registry
        .create(app.owner_id, new_webhook("active", "https://api.doordash.com/drive"))
        .await
        .unwrap();
    app.registry
        .create(
            app.owner_id,
            NewWebhook {
                is_active: false,
                destination_type: EndpointType::Ecommerce,
                ..new_webhook("inactive", "https://erp.example/hook")
            },
        )
        .await
        .unwrap();

    let all = app
        .registry
        .list(app.owner_id, WebhookFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let active = app
        .registry
        .list(
            app.owner_id,
            WebhookFilter {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "active");

    let to_ecommerce = app
        .registry
        .list(
            app.owner_id,
            WebhookFilter {
                destination_type: Some(EndpointType::Ecommerce),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(to_ecommerce.len(), 1);
    assert_eq!(to_ecommerce[0].name, "inactive");
}

/// 删除定义后历史日志仍可查询
#[tokio::test]
async fn test_delete_keeps_logs() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    app.receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-del", &shopify_order("#1201")),
        )
        .await
        .unwrap();

    app.registry.delete(app.owner_id, webhook.id).await.unwrap();

    assert!(matches!(
        app.registry.get(app.owner_id, webhook.id).await,
        Err(BridgeError::NotFound(_))
    ));
    assert!(matches!(
        app.registry.delete(app.owner_id, webhook.id).await,
        Err(BridgeError::NotFound(_))
    ));
    let logs = app.registry.logs(app.owner_id, webhook.id, None).await.unwrap();
    assert_eq!(logs.len(), 1);

    // the deleted secret no longer authenticates
    let err = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-del-2", &shopify_order("#1202")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Authentication));
}
