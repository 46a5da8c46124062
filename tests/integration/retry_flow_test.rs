// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, create_test_app_with, shopify_order, shopify_request};
use orderbridge::domain::models::dispatch_job::DispatchJobStatus;
use orderbridge::domain::models::order::FulfillmentStatus;
use orderbridge::domain::models::webhook_log::LogStatus;
use orderbridge::domain::services::event_router::JobStatus;
use orderbridge::providers::traits::ProviderError;
use std::collections::HashMap;

/// 连续三次超时后第四次成功：四条日志、一个配送
#[tokio::test]
async fn test_three_timeouts_then_success() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    app.provider.fail_times(3, ProviderError::Timeout);

    let ack = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-retry", &shopify_order("#7001")),
        )
        .await
        .unwrap();
    let job_id = match &ack.jobs[0].status {
        JobStatus::RetryScheduled { job_id, .. } => *job_id,
        other => panic!("expected a scheduled retry, got {:?}", other),
    };

    for _ in 0..3 {
        assert_eq!(app.worker.process_due_jobs().await.unwrap(), 1);
    }
    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 0);
    assert_eq!(app.provider.calls(), 4);

    let job = app.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, DispatchJobStatus::Succeeded);
    assert_eq!(job.attempt_count, 4);
    assert_eq!(job.next_retry_at, None);
    assert_eq!(job.idempotency_key, ack.idempotency_key);

    let logs = app.logs_for(webhook.id).await;
    assert_eq!(logs.len(), 4);
    assert_eq!(logs.iter().filter(|l| l.status == LogStatus::Failed).count(), 3);
    assert_eq!(logs.iter().filter(|l| l.status == LogStatus::Success).count(), 1);
    let mut attempts: Vec<i32> = logs.iter().map(|l| l.attempt_count).collect();
    attempts.sort();
    assert_eq!(attempts, vec![1, 2, 3, 4]);
    let success = logs.iter().find(|l| l.status == LogStatus::Success).unwrap();
    assert_eq!(success.attempt_count, 4);

    // every attempt reused the same provider idempotency key
    assert!(app
        .provider
        .requests()
        .iter()
        .all(|r| r.idempotency_key == ack.idempotency_key));

    let order = app
        .orders
        .find_by_number(app.owner_id, "7001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Dispatched);
    let delivery = app
        .deliveries
        .find_active_by_order(app.owner_id, order.id)
        .await
        .unwrap();
    assert!(delivery.is_some());
}

/// 重试耗尽后任务进入死信，订单标记为派单失败
#[tokio::test]
async fn test_exhausted_retries_mark_dispatch_failed() {
    let app = create_test_app_with(HashMap::new(), 2).await;
    let webhook = app.shopify_to_delivery().await;
    app.provider
        .fail_times(5, ProviderError::Transient("status 503: unavailable".to_string()));

    let ack = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-dead", &shopify_order("#7002")),
        )
        .await
        .unwrap();
    assert!(matches!(ack.jobs[0].status, JobStatus::RetryScheduled { .. }));

    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 1);
    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 0);
    assert_eq!(app.provider.calls(), 2);

    let job = app
        .jobs
        .find_by_key(app.owner_id, webhook.id, &ack.idempotency_key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, DispatchJobStatus::Dead);
    assert_eq!(job.attempt_count, 2);
    assert!(job.last_error.unwrap().contains("503"));

    let order = app
        .orders
        .find_by_number(app.owner_id, "7002")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.fulfillment_status, FulfillmentStatus::DispatchFailed);

    let logs = app.logs_for(webhook.id).await;
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.status == LogStatus::Failed));
}

/// 只允许一次尝试时首次瞬时失败即进入死信
#[tokio::test]
async fn test_single_attempt_policy_fails_immediately() {
    let app = create_test_app_with(HashMap::new(), 1).await;
    let webhook = app.shopify_to_delivery().await;
    app.provider.fail_times(1, ProviderError::Timeout);

    let ack = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-once", &shopify_order("#7003")),
        )
        .await
        .unwrap();
    assert!(matches!(ack.jobs[0].status, JobStatus::Failed { .. }));

    let job = app
        .jobs
        .find_by_key(app.owner_id, webhook.id, &ack.idempotency_key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, DispatchJobStatus::Dead);
    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 0);

    let order = app
        .orders
        .find_by_number(app.owner_id, "7003")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.fulfillment_status, FulfillmentStatus::DispatchFailed);
}

/// 服务商重发已完成工作后，待重试任务直接关闭
#[tokio::test]
async fn test_redelivery_satisfies_pending_job() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    app.provider.fail_times(1, ProviderError::Timeout);
    let request = shopify_request("orders/create", "evt-redeliver", &shopify_order("#7004"));

    let first = app
        .receiver
        .receive(&webhook.secret_key, request.clone())
        .await
        .unwrap();
    assert!(matches!(first.jobs[0].status, JobStatus::RetryScheduled { .. }));

    // no success yet, so the redelivery is processed rather than replayed
    let second = app
        .receiver
        .receive(&webhook.secret_key, request)
        .await
        .unwrap();
    assert!(!second.replay);
    assert_eq!(second.jobs[0].status, JobStatus::Succeeded);

    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 1);
    assert_eq!(app.provider.calls(), 2);

    let job = app
        .jobs
        .find_by_key(app.owner_id, webhook.id, &first.idempotency_key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, DispatchJobStatus::Succeeded);
}

/// 转发的瞬时失败同样由后台重试补齐
#[tokio::test]
async fn test_forward_retry_succeeds_in_background() {
    let app = create_test_app().await;
    let url = "https://erp.example/orders";
    let webhook = app.shopify_forward(url).await;
    app.forwarder
        .fail_url(url, ProviderError::Transient("status 502: bad gateway".to_string()), 1);

    let ack = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-fwd", &shopify_order("#7005")),
        )
        .await
        .unwrap();
    assert!(matches!(ack.jobs[0].status, JobStatus::RetryScheduled { .. }));
    assert!(app.forwarder.forwarded().is_empty());

    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 1);
    assert_eq!(
        app.forwarder.forwarded(),
        vec![(webhook.id, ack.idempotency_key.clone())]
    );

    let logs = app.logs_for(webhook.id).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs.iter().filter(|l| l.status == LogStatus::Success).count(), 1);
}

/// 定义删除后待重试任务被放弃
#[tokio::test]
async fn test_job_for_deleted_webhook_is_abandoned() {
    let app = create_test_app().await;
    let webhook = app.shopify_to_delivery().await;
    app.provider.fail_times(1, ProviderError::Timeout);

    let ack = app
        .receiver
        .receive(
            &webhook.secret_key,
            shopify_request("orders/create", "evt-orphan", &shopify_order("#7006")),
        )
        .await
        .unwrap();
    app.registry.delete(app.owner_id, webhook.id).await.unwrap();

    assert_eq!(app.worker.process_due_jobs().await.unwrap(), 1);
    assert_eq!(app.provider.calls(), 1);

    let job = app
        .jobs
        .find_by_key(app.owner_id, webhook.id, &ack.idempotency_key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, DispatchJobStatus::Dead);
    assert_eq!(job.last_error.as_deref(), Some("webhook deleted or inactive"));
}
