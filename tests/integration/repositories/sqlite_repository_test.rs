// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{pickup_location, setup_db};
use chrono::{Duration, Utc};
use orderbridge::domain::models::delivery::{
    Delivery, DeliveryStatus, DeliveryStatusUpdate, DispatchRecord, StatusUpdateOutcome,
};
use orderbridge::domain::models::dispatch_job::{DispatchJob, DispatchJobStatus};
use orderbridge::domain::models::event::{DomainEvent, OrderPayload, ProviderPayload};
use orderbridge::domain::models::location::Coordinates;
use orderbridge::domain::models::order::{FulfillmentStatus, Order, OrderStatus, OrderStatusChange};
use orderbridge::domain::models::webhook::{
    EndpointType, EventType, NewWebhook, WebhookDefinition, WebhookFilter,
};
use orderbridge::domain::models::webhook_log::{LogStatus, WebhookLog};
use orderbridge::domain::repositories::delivery_repository::DeliveryRepository;
use orderbridge::domain::repositories::dispatch_job_repository::DispatchJobRepository;
use orderbridge::domain::repositories::order_repository::OrderRepository;
use orderbridge::domain::repositories::webhook_log_repository::WebhookLogRepository;
use orderbridge::domain::repositories::webhook_repository::WebhookRepository;
use orderbridge::infrastructure::repositories::delivery_repo_impl::DeliveryRepositoryImpl;
use orderbridge::infrastructure::repositories::dispatch_job_repo_impl::DispatchJobRepositoryImpl;
use orderbridge::infrastructure::repositories::order_repo_impl::OrderRepositoryImpl;
use orderbridge::infrastructure::repositories::webhook_log_repo_impl::WebhookLogRepoImpl;
use orderbridge::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use orderbridge::utils::errors::RepositoryError;
use uuid::Uuid;

fn definition(owner_id: Uuid) -> WebhookDefinition {
    WebhookDefinition::new(
        owner_id,
        NewWebhook {
            name: "Shopify to DoorDash".to_string(),
            description: None,
            source_type: EndpointType::Ecommerce,
            source_provider: "shopify".to_string(),
            destination_type: EndpointType::Delivery,
            destination_provider: "doordash".to_string(),
            endpoint_url: "https://openapi.doordash.com/drive/v2/deliveries".to_string(),
            event_types: vec![EventType::OrderCreated],
            is_active: true,
            pickup: Some(pickup_location()),
        },
    )
}

fn order_event(native_id: &str, order_number: &str) -> DomainEvent {
    DomainEvent::new(
        EventType::OrderCreated,
        EndpointType::Ecommerce,
        "shopify",
        native_id,
        Utc::now(),
        ProviderPayload::Order(OrderPayload {
            order_number: order_number.to_string(),
            total_amount: Some(1500),
            ..Default::default()
        }),
    )
}

fn status_log(owner_id: Uuid) -> impl Fn(&StatusUpdateOutcome) -> WebhookLog + Send + Sync {
    move |outcome| {
        let note = match outcome {
            StatusUpdateOutcome::Applied { .. } => "applied",
            StatusUpdateOutcome::Ignored { .. } => "ignored",
        };
        WebhookLog::success(owner_id, Uuid::nil()).with_note(note)
    }
}

fn delivery(owner_id: Uuid, order_id: Uuid, external_id: &str) -> Delivery {
    let pickup = pickup_location();
    let now = Utc::now();
    Delivery {
        id: Uuid::new_v4(),
        owner_id,
        order_id: Some(order_id),
        integration_id: None,
        provider: "doordash".to_string(),
        external_id: Some(external_id.to_string()),
        status: DeliveryStatus::Created,
        pickup_address: pickup.address.clone(),
        pickup_contact: Some(pickup.contact.clone()),
        dropoff_address: pickup.address,
        dropoff_contact: None,
        current_location: None,
        pickup_eta: None,
        dropoff_eta: None,
        fee: Some(650),
        currency: Some("USD".to_string()),
        tracking_url: None,
        metadata: serde_json::json!({"source_provider": "shopify"}),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_webhook_repository_round_trip_and_unique_secret() {
    let db = setup_db().await;
    let repo = WebhookRepoImpl::new(db);
    let owner_id = Uuid::new_v4();

    let def = definition(owner_id);
    repo.create(&def).await.unwrap();

    let found = repo.find_by_secret(&def.secret_key).await.unwrap().unwrap();
    assert_eq!(found.id, def.id);
    assert_eq!(found.event_types, def.event_types);
    assert_eq!(found.pickup, def.pickup);

    let mut clash = definition(owner_id);
    clash.secret_key = def.secret_key.clone();
    assert!(matches!(
        repo.create(&clash).await,
        Err(RepositoryError::AlreadyExists)
    ));

    assert!(repo.find_by_id(Uuid::new_v4(), def.id).await.unwrap().is_none());
    assert_eq!(
        repo.list(owner_id, WebhookFilter::default()).await.unwrap().len(),
        1
    );
    assert!(!repo.delete(Uuid::new_v4(), def.id).await.unwrap());
    assert!(repo.delete(owner_id, def.id).await.unwrap());
    assert!(repo.find_by_secret(&def.secret_key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_first_success_ignores_failures_and_replays() {
    let db = setup_db().await;
    let repo = WebhookLogRepoImpl::new(db);
    let owner_id = Uuid::new_v4();
    let def = definition(owner_id);
    let event = order_event("evt-1", "1001");

    let failed = WebhookLog::for_event(&def, &event, LogStatus::Failed).with_error("timeout");
    repo.append(&failed).await.unwrap();
    assert!(repo
        .find_success_by_key(owner_id, event.idempotency_key())
        .await
        .unwrap()
        .is_none());

    let mut success = WebhookLog::for_event(&def, &event, LogStatus::Success).with_attempt(2);
    success.created_at = Utc::now() + Duration::milliseconds(5);
    repo.append(&success).await.unwrap();

    let mut replay = WebhookLog::for_event(&def, &event, LogStatus::Success).with_note("replay");
    replay.replay_of = Some(success.id);
    replay.created_at = Utc::now() - Duration::seconds(60);
    repo.append(&replay).await.unwrap();

    let first = repo
        .find_success_by_key(owner_id, event.idempotency_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, success.id);
    assert_eq!(first.attempt_count, 2);

    let scoped = repo
        .find_success_for_webhook(owner_id, Uuid::new_v4(), event.idempotency_key())
        .await
        .unwrap();
    assert!(scoped.is_none());
    assert!(repo
        .find_success_by_key(Uuid::new_v4(), event.idempotency_key())
        .await
        .unwrap()
        .is_none());

    let listed = repo.list_by_webhook(owner_id, def.id, 2).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, success.id);
}

#[tokio::test]
async fn test_order_number_is_unique_per_owner() {
    let db = setup_db().await;
    let repo = OrderRepositoryImpl::new(db);
    let owner_id = Uuid::new_v4();
    let payload = OrderPayload {
        order_number: "1001".to_string(),
        ..Default::default()
    };

    let order = Order::from_payload(owner_id, "shopify", &payload);
    repo.create(&order).await.unwrap();
    assert!(matches!(
        repo.create(&Order::from_payload(owner_id, "shopify", &payload)).await,
        Err(RepositoryError::AlreadyExists)
    ));
    // another owner may reuse the number
    repo.create(&Order::from_payload(Uuid::new_v4(), "shopify", &payload))
        .await
        .unwrap();

    let updated = repo
        .update_status(
            owner_id,
            order.id,
            OrderStatusChange {
                status: None,
                fulfillment_status: FulfillmentStatus::DispatchFailed,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Pending);
    assert_eq!(updated.fulfillment_status, FulfillmentStatus::DispatchFailed);

    let found = repo.find_by_number(owner_id, "1001").await.unwrap().unwrap();
    assert_eq!(found.fulfillment_status, FulfillmentStatus::DispatchFailed);
}

#[tokio::test]
async fn test_delivery_status_updates_only_move_forward() {
    let db = setup_db().await;
    let repo = DeliveryRepositoryImpl::new(db);
    let owner_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let created = repo
        .create(&delivery(owner_id, order_id, "dd_1"))
        .await
        .unwrap();

    let found = repo
        .find_by_external_id(owner_id, "doordash", "dd_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.metadata["source_provider"], "shopify");

    let mut update = DeliveryStatusUpdate::status(DeliveryStatus::PickedUp);
    update.courier_location = Some(Coordinates { lat: 1.5, lng: 2.5 });
    match repo
        .apply_status_update(owner_id, created.id, &update, &status_log(owner_id))
        .await
        .unwrap()
    {
        StatusUpdateOutcome::Applied { previous, delivery } => {
            assert_eq!(previous, DeliveryStatus::Created);
            assert_eq!(delivery.status, DeliveryStatus::PickedUp);
            assert_eq!(delivery.current_location, Some(Coordinates { lat: 1.5, lng: 2.5 }));
        }
        other => panic!("expected applied, got {:?}", other),
    }

    match repo
        .apply_status_update(
            owner_id,
            created.id,
            &DeliveryStatusUpdate::status(DeliveryStatus::Assigned),
            &status_log(owner_id),
        )
        .await
        .unwrap()
    {
        StatusUpdateOutcome::Ignored { rejected, delivery } => {
            assert_eq!(rejected.from, DeliveryStatus::PickedUp);
            assert_eq!(rejected.to, DeliveryStatus::Assigned);
            assert_eq!(delivery.status, DeliveryStatus::PickedUp);
        }
        other => panic!("expected ignored, got {:?}", other),
    }

    assert!(repo
        .find_active_by_order(owner_id, order_id)
        .await
        .unwrap()
        .is_some());
    repo.apply_status_update(
        owner_id,
        created.id,
        &DeliveryStatusUpdate::status(DeliveryStatus::Delivered),
        &status_log(owner_id),
    )
    .await
    .unwrap();
    assert!(repo
        .find_active_by_order(owner_id, order_id)
        .await
        .unwrap()
        .is_none());

    assert!(matches!(
        repo.apply_status_update(
            Uuid::new_v4(),
            created.id,
            &DeliveryStatusUpdate::status(DeliveryStatus::Cancelled),
            &status_log(owner_id),
        )
        .await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_dispatch_jobs_due_and_unique_per_key() {
    let db = setup_db().await;
    let repo = DispatchJobRepositoryImpl::new(db);
    let owner_id = Uuid::new_v4();
    let webhook_id = Uuid::new_v4();

    let mut due = DispatchJob::new(owner_id, webhook_id, order_event("evt-due", "1"), 1, 5);
    due.next_retry_at = Some(Utc::now() - Duration::seconds(1));
    repo.create(&due).await.unwrap();

    let mut later = DispatchJob::new(owner_id, webhook_id, order_event("evt-later", "2"), 1, 5);
    later.next_retry_at = Some(Utc::now() + Duration::minutes(10));
    repo.create(&later).await.unwrap();

    let mut dead = DispatchJob::new(owner_id, webhook_id, order_event("evt-dead", "3"), 5, 5);
    dead.status = DispatchJobStatus::Dead;
    dead.next_retry_at = Some(Utc::now() - Duration::seconds(30));
    repo.create(&dead).await.unwrap();

    let found = repo.find_due(Utc::now(), 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, due.id);
    assert_eq!(found[0].event, due.event);

    let duplicate = DispatchJob::new(owner_id, webhook_id, order_event("evt-due", "1"), 1, 5);
    assert!(matches!(
        repo.create(&duplicate).await,
        Err(RepositoryError::AlreadyExists)
    ));

    let by_key = repo
        .find_by_key(owner_id, webhook_id, due.event.idempotency_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.id, due.id);

    let mut done = by_key;
    done.status = DispatchJobStatus::Succeeded;
    done.next_retry_at = None;
    repo.update(&done).await.unwrap();
    assert!(repo.find_due(Utc::now(), 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_update_writes_order_and_log_together() {
    let db = setup_db().await;
    let orders = OrderRepositoryImpl::new(db.clone());
    let deliveries = DeliveryRepositoryImpl::new(db.clone());
    let logs = WebhookLogRepoImpl::new(db);
    let owner_id = Uuid::new_v4();
    let webhook_id = Uuid::new_v4();

    let payload = OrderPayload {
        order_number: "2001".to_string(),
        ..Default::default()
    };
    let order = orders
        .create(&Order::from_payload(owner_id, "shopify", &payload))
        .await
        .unwrap();
    let created = deliveries
        .create(&delivery(owner_id, order.id, "dd_2001"))
        .await
        .unwrap();

    // a log id that already exists makes the final insert fail
    let taken = WebhookLog::success(owner_id, webhook_id);
    logs.append(&taken).await.unwrap();
    let clashing = taken.clone();
    let result = deliveries
        .apply_status_update(
            owner_id,
            created.id,
            &DeliveryStatusUpdate::status(DeliveryStatus::Delivered),
            &move |_: &StatusUpdateOutcome| clashing.clone(),
        )
        .await;
    assert!(result.is_err());

    let unchanged = deliveries
        .find_by_id(owner_id, created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, DeliveryStatus::Created);
    let order_after_rollback = orders.find_by_id(owner_id, order.id).await.unwrap().unwrap();
    assert_eq!(order_after_rollback.status, OrderStatus::Pending);
    assert_eq!(
        order_after_rollback.fulfillment_status,
        FulfillmentStatus::Unfulfilled
    );

    let outcome = deliveries
        .apply_status_update(
            owner_id,
            created.id,
            &DeliveryStatusUpdate::status(DeliveryStatus::Delivered),
            &move |_: &StatusUpdateOutcome| {
                WebhookLog::success(owner_id, webhook_id).with_note("delivered")
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, StatusUpdateOutcome::Applied { .. }));

    let delivered = orders.find_by_id(owner_id, order.id).await.unwrap().unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.fulfillment_status, FulfillmentStatus::Fulfilled);

    let written = logs.list_by_webhook(owner_id, webhook_id, 10).await.unwrap();
    assert_eq!(written.len(), 2);
    assert!(written.iter().any(|l| l.note.as_deref() == Some("delivered")));
}

#[tokio::test]
async fn test_record_dispatch_keeps_one_active_delivery() {
    let db = setup_db().await;
    let orders = OrderRepositoryImpl::new(db.clone());
    let deliveries = DeliveryRepositoryImpl::new(db.clone());
    let logs = WebhookLogRepoImpl::new(db);
    let owner_id = Uuid::new_v4();
    let webhook_id = Uuid::new_v4();

    let payload = OrderPayload {
        order_number: "2002".to_string(),
        ..Default::default()
    };
    let order = orders
        .create(&Order::from_payload(owner_id, "shopify", &payload))
        .await
        .unwrap();

    let log = move |record: &DispatchRecord| match record {
        DispatchRecord::Created(_) => WebhookLog::success(owner_id, webhook_id),
        DispatchRecord::AlreadyActive(_) => {
            WebhookLog::success(owner_id, webhook_id).with_note("already dispatched")
        }
    };

    let first = deliveries
        .record_dispatch(&delivery(owner_id, order.id, "dd_a"), &log)
        .await
        .unwrap();
    let first_id = match first {
        DispatchRecord::Created(d) => d.id,
        other => panic!("expected created, got {:?}", other),
    };

    let second = deliveries
        .record_dispatch(&delivery(owner_id, order.id, "dd_b"), &log)
        .await
        .unwrap();
    match second {
        DispatchRecord::AlreadyActive(d) => assert_eq!(d.id, first_id),
        other => panic!("expected already active, got {:?}", other),
    }
    assert!(deliveries
        .find_by_external_id(owner_id, "doordash", "dd_b")
        .await
        .unwrap()
        .is_none());

    let dispatched = orders.find_by_id(owner_id, order.id).await.unwrap().unwrap();
    assert_eq!(dispatched.status, OrderStatus::Confirmed);
    assert_eq!(dispatched.fulfillment_status, FulfillmentStatus::Dispatched);

    let written = logs.list_by_webhook(owner_id, webhook_id, 10).await.unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
        written
            .iter()
            .filter(|l| l.note.as_deref() == Some("already dispatched"))
            .count(),
        1
    );

    assert!(matches!(
        deliveries
            .record_dispatch(&delivery(owner_id, Uuid::new_v4(), "dd_c"), &log)
            .await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_order_refresh_keeps_status_written_meanwhile() {
    let db = setup_db().await;
    let repo = OrderRepositoryImpl::new(db);
    let owner_id = Uuid::new_v4();
    let payload = OrderPayload {
        order_number: "2003".to_string(),
        total_amount: Some(1000),
        ..Default::default()
    };
    let order = repo
        .create(&Order::from_payload(owner_id, "shopify", &payload))
        .await
        .unwrap();

    // snapshot taken before the delivery completes
    let mut stale = repo.find_by_id(owner_id, order.id).await.unwrap().unwrap();

    repo.update_status(
        owner_id,
        order.id,
        OrderStatusChange {
            status: Some(OrderStatus::Delivered),
            fulfillment_status: FulfillmentStatus::Fulfilled,
        },
    )
    .await
    .unwrap();

    stale.refresh_from(&OrderPayload {
        order_number: "2003".to_string(),
        total_amount: Some(2500),
        ..Default::default()
    });
    let refreshed = repo.update(&stale).await.unwrap();
    assert_eq!(refreshed.total_amount, 2500);
    assert_eq!(refreshed.status, OrderStatus::Delivered);
    assert_eq!(refreshed.fulfillment_status, FulfillmentStatus::Fulfilled);
}

#[tokio::test]
async fn test_cancel_leaves_terminal_orders_alone() {
    let db = setup_db().await;
    let repo = OrderRepositoryImpl::new(db);
    let owner_id = Uuid::new_v4();

    let open = repo
        .create(&Order::from_payload(
            owner_id,
            "shopify",
            &OrderPayload {
                order_number: "2004".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();
    repo.update_status(
        owner_id,
        open.id,
        OrderStatusChange {
            status: None,
            fulfillment_status: FulfillmentStatus::Dispatched,
        },
    )
    .await
    .unwrap();
    let cancelled = repo.cancel(owner_id, open.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.fulfillment_status, FulfillmentStatus::Dispatched);

    let done = repo
        .create(&Order::from_payload(
            owner_id,
            "shopify",
            &OrderPayload {
                order_number: "2005".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();
    repo.update_status(
        owner_id,
        done.id,
        OrderStatusChange {
            status: Some(OrderStatus::Delivered),
            fulfillment_status: FulfillmentStatus::Fulfilled,
        },
    )
    .await
    .unwrap();
    let kept = repo.cancel(owner_id, done.id).await.unwrap();
    assert_eq!(kept.status, OrderStatus::Delivered);
    assert_eq!(kept.fulfillment_status, FulfillmentStatus::Fulfilled);

    assert!(matches!(
        repo.cancel(Uuid::new_v4(), done.id).await,
        Err(RepositoryError::NotFound)
    ));
}
