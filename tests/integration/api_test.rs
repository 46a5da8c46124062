// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, shopify_order};
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

const OWNER_HEADER: &str = "x-owner-id";

fn create_body() -> Value {
    json!({
        "name": "Shop to Uber",
        "source_type": "ecommerce",
        "source_provider": "shopify",
        "destination_type": "delivery",
        "destination_provider": "uber_direct",
        "endpoint_url": "https://api.uber.com/v1/deliveries",
        "event_types": ["order.created"],
        "pickup": {
            "name": "Noodle Bar",
            "address": {"line1": "500 Howard St", "city": "San Francisco"},
            "contact": {"name": "Front Desk", "phone": "+14155550000"}
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_management_requires_owner_header() {
    let app = create_test_app().await;

    let response = app.server.get("/api/webhooks").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/api/webhooks")
        .add_header(OWNER_HEADER, "not-a-uuid")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_crud() {
    let app = create_test_app().await;
    let owner = app.owner_id.to_string();

    let response = app
        .server
        .post("/api/webhooks")
        .add_header(OWNER_HEADER, owner.clone())
        .json(&create_body())
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["secret_key"].as_str().unwrap().len(), 64);
    assert_eq!(created["event_types"], json!(["order.created"]));
    assert_eq!(created["is_active"], true);

    let response = app
        .server
        .get("/api/webhooks")
        .add_header(OWNER_HEADER, owner.clone())
        .await;
    response.assert_status_ok();
    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 1);

    let response = app
        .server
        .patch(&format!("/api/webhooks/{}", id))
        .add_header(OWNER_HEADER, owner.clone())
        .json(&json!({"name": "Renamed", "is_active": false}))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["secret_key"], created["secret_key"]);

    let response = app
        .server
        .get("/api/webhooks?is_active=true")
        .add_header(OWNER_HEADER, owner.clone())
        .await;
    let active: Vec<Value> = response.json();
    assert!(active.is_empty());

    let response = app
        .server
        .patch(&format!("/api/webhooks/{}", id))
        .add_header(OWNER_HEADER, owner.clone())
        .json(&json!({"secret_key": "0".repeat(64)}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // other tenants cannot see the definition
    let response = app
        .server
        .get(&format!("/api/webhooks/{}", id))
        .add_header(OWNER_HEADER, Uuid::new_v4().to_string())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .delete(&format!("/api/webhooks/{}", id))
        .add_header(OWNER_HEADER, owner.clone())
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server
        .get(&format!("/api/webhooks/{}", id))
        .add_header(OWNER_HEADER, owner)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_invalid_body() {
    let app = create_test_app().await;
    let owner = app.owner_id.to_string();

    let mut body = create_body();
    body["endpoint_url"] = json!("not a url");
    let response = app
        .server
        .post("/api/webhooks")
        .add_header(OWNER_HEADER, owner.clone())
        .json(&body)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert!(error["error"].is_string());

    let mut body = create_body();
    body["source_type"] = json!("marketplace");
    let response = app
        .server
        .post("/api/webhooks")
        .add_header(OWNER_HEADER, owner)
        .json(&body)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inbound_webhook_and_logs() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    let path = format!("/api/webhook/{}", webhook.secret_key);

    let response = app
        .server
        .post(&path)
        .add_header("X-Shopify-Topic", "orders/create")
        .add_header("X-Shopify-Webhook-Id", "evt-api-1")
        .json(&shopify_order("#9001"))
        .await;
    response.assert_status_ok();
    let ack: Value = response.json();
    assert_eq!(ack["replay"], false);
    assert_eq!(ack["event_type"], "order.created");
    assert_eq!(ack["jobs"][0]["status"], "succeeded");
    assert_eq!(ack["jobs"][0]["webhook_id"], webhook.id.to_string());

    let response = app
        .server
        .post(&path)
        .add_header("X-Shopify-Topic", "orders/create")
        .add_header("X-Shopify-Webhook-Id", "evt-api-1")
        .json(&shopify_order("#9001"))
        .await;
    response.assert_status_ok();
    let replay: Value = response.json();
    assert_eq!(replay["replay"], true);
    assert_eq!(replay["previous_response"]["external_id"], "del_1");

    let response = app
        .server
        .get(&format!("/api/webhooks/{}/logs?limit=10", webhook.id))
        .add_header(OWNER_HEADER, app.owner_id.to_string())
        .await;
    response.assert_status_ok();
    let logs: Vec<Value> = response.json();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l["status"] == "success"));
}

#[tokio::test]
async fn test_inbound_error_statuses() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;

    let response = app
        .server
        .post("/api/webhook/unknown-secret")
        .add_header("X-Shopify-Topic", "orders/create")
        .add_header("X-Shopify-Webhook-Id", "evt-api-2")
        .json(&shopify_order("#9002"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .post(&format!("/api/webhook/{}", webhook.secret_key))
        .add_header("X-Shopify-Topic", "products/create")
        .add_header("X-Shopify-Webhook-Id", "evt-api-3")
        .json(&json!({"id": 1}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let callback = app.uber_status_callback().await;
    let response = app
        .server
        .post(&format!("/api/webhook/{}", callback.secret_key))
        .json(&json!({"id": "evt-u", "delivery_id": "nope", "status": "pickup"}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}
