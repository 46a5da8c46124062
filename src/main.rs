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

use orderbridge::config::settings::Settings;
use orderbridge::decoders::registry::DecoderRegistry;
use orderbridge::domain::repositories::delivery_repository::DeliveryRepository;
use orderbridge::domain::repositories::dispatch_job_repository::DispatchJobRepository;
use orderbridge::domain::repositories::order_repository::OrderRepository;
use orderbridge::domain::repositories::webhook_log_repository::WebhookLogRepository;
use orderbridge::domain::repositories::webhook_repository::WebhookRepository;
use orderbridge::domain::services::delivery_dispatcher::DeliveryDispatcher;
use orderbridge::domain::services::event_router::EventRouter;
use orderbridge::domain::services::order_ingestion::OrderIngestion;
use orderbridge::domain::services::receiver::WebhookReceiver;
use orderbridge::domain::services::retry_manager::RetryManager;
use orderbridge::domain::services::status_reconciler::StatusReconciler;
use orderbridge::domain::services::webhook_registry::WebhookRegistry;
use orderbridge::infrastructure::database::connection;
use orderbridge::infrastructure::metrics::init_metrics;
use orderbridge::infrastructure::repositories::delivery_repo_impl::DeliveryRepositoryImpl;
use orderbridge::infrastructure::repositories::dispatch_job_repo_impl::DispatchJobRepositoryImpl;
use orderbridge::infrastructure::repositories::order_repo_impl::OrderRepositoryImpl;
use orderbridge::infrastructure::repositories::webhook_log_repo_impl::WebhookLogRepoImpl;
use orderbridge::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use orderbridge::presentation::routes;
use orderbridge::providers::http_delivery::HttpDeliveryProvider;
use orderbridge::providers::http_forwarder::HttpEventForwarder;
use orderbridge::providers::registry::ProviderRegistry;
use orderbridge::providers::traits::DeliveryProvider;
use orderbridge::utils::retry_policy::RetryPolicy;
use orderbridge::utils::telemetry;
use orderbridge::workers::{RetryWorker, RetryWorkerConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting orderbridge...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    // 4. Repositories
    let webhooks: Arc<dyn WebhookRepository> = Arc::new(WebhookRepoImpl::new(db.clone()));
    let logs: Arc<dyn WebhookLogRepository> = Arc::new(WebhookLogRepoImpl::new(db.clone()));
    let orders: Arc<dyn OrderRepository> = Arc::new(OrderRepositoryImpl::new(db.clone()));
    let deliveries: Arc<dyn DeliveryRepository> =
        Arc::new(DeliveryRepositoryImpl::new(db.clone()));
    let jobs: Arc<dyn DispatchJobRepository> = Arc::new(DispatchJobRepositoryImpl::new(db.clone()));

    // 5. Provider capabilities
    let timeout = settings.providers.timeout();
    let providers = ProviderRegistry::default();
    for account in &settings.providers.accounts {
        match HttpDeliveryProvider::new(account, timeout) {
            Ok(provider) => providers.register(Arc::new(provider) as Arc<dyn DeliveryProvider>),
            Err(e) => warn!("Skipping delivery provider {}: {}", account.name, e),
        }
    }
    if providers.names().is_empty() {
        warn!("No delivery provider accounts configured; delivery dispatch will fail");
    }
    let providers = Arc::new(providers);
    let forwarder = Arc::new(HttpEventForwarder::new(timeout));

    // 6. Domain services
    let retry = Arc::new(RetryManager::new(
        jobs.clone(),
        orders.clone(),
        RetryPolicy::from_settings(&settings.retry),
    ));
    let dispatcher = Arc::new(DeliveryDispatcher::new(
        orders.clone(),
        deliveries.clone(),
        logs.clone(),
        providers,
        timeout,
    ));
    let router = Arc::new(EventRouter::new(
        webhooks.clone(),
        logs.clone(),
        dispatcher,
        forwarder,
        retry.clone(),
    ));
    let ingestion = Arc::new(OrderIngestion::new(orders.clone()));
    let reconciler = Arc::new(StatusReconciler::new(deliveries, logs.clone()));
    let receiver = Arc::new(
        WebhookReceiver::new(
            webhooks.clone(),
            logs.clone(),
            Arc::new(DecoderRegistry::default()),
            ingestion,
            reconciler,
            router.clone(),
        )
        .with_signing_secrets(settings.providers.signing_secrets.clone()),
    );
    let registry = Arc::new(WebhookRegistry::new(webhooks.clone(), logs.clone()));

    // 7. Retry worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = RetryWorker::new(
        jobs,
        webhooks,
        logs,
        router,
        retry,
        RetryWorkerConfig {
            poll_interval: settings.retry.poll_interval(),
            batch_size: settings.retry.batch_size,
            concurrency: settings.retry.concurrency,
        },
    );
    let worker_handle = tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });

    // 8. Start HTTP server
    let app = routes::routes(registry, receiver);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, waiting for retry worker");
    let _ = shutdown_tx.send(true);
    worker_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
