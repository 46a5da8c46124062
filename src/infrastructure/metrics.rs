// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 安装 Prometheus 导出器并登记指标说明
///
/// 监听地址无效或端口被占用时只记录警告，不影响服务启动。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!(
        "orderbridge_inbound_events_total",
        "Inbound webhook requests by outcome"
    );
    describe_counter!(
        "orderbridge_dispatch_total",
        "Delivery provider dispatch attempts by provider and result"
    );
    describe_histogram!(
        "orderbridge_provider_call_duration_seconds",
        "Latency of delivery provider calls"
    );
    describe_counter!(
        "orderbridge_forward_total",
        "Events forwarded to e-commerce endpoints by result"
    );
    describe_counter!(
        "orderbridge_status_transitions_total",
        "Delivery status callbacks by result"
    );
    describe_counter!(
        "orderbridge_retry_attempts_total",
        "Retry attempts made by the retry worker"
    );
    describe_counter!(
        "orderbridge_retries_scheduled_total",
        "Jobs scheduled for a later retry"
    );
    describe_counter!(
        "orderbridge_dead_jobs_total",
        "Jobs that exhausted their retry budget"
    );

    info!("Metrics exporter listening on {}", addr);
}
