// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::traits::{DecodeError, InboundRequest, PayloadDecoder};
use crate::domain::models::event::{DeliveryStatusPayload, DomainEvent, ProviderPayload};
use crate::domain::models::location::Coordinates;
use crate::domain::models::webhook::EndpointType;
use crate::domain::services::status_reconciler::map_provider_status;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// DoorDash Drive 配送状态回调解码器
///
/// DoorDash 不提供独立的事件ID，原生ID由配送ID、事件名与发生时间组合而成。
pub struct DoorDashDecoder;

#[derive(Debug, Deserialize)]
struct DoorDashEvent {
    event_name: String,
    external_delivery_id: String,
    created_at: Option<DateTime<Utc>>,
    dasher_name: Option<String>,
    dasher_location: Option<DasherLocation>,
    pickup_time_estimated: Option<DateTime<Utc>>,
    dropoff_time_estimated: Option<DateTime<Utc>>,
    tracking_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DasherLocation {
    lat: f64,
    lng: f64,
}

impl PayloadDecoder for DoorDashDecoder {
    fn provider(&self) -> &str {
        "doordash"
    }

    fn source_types(&self) -> &[EndpointType] {
        &[EndpointType::Delivery]
    }

    fn decode(&self, request: &InboundRequest) -> Result<DomainEvent, DecodeError> {
        let event: DoorDashEvent = request.json()?;
        let status = map_provider_status(self.provider(), &event.event_name)
            .ok_or_else(|| DecodeError::UnknownEvent(event.event_name.clone()))?;

        let occurred_at = event.created_at.unwrap_or_else(Utc::now);
        let native_id = match event.created_at {
            Some(at) => format!("{}:{}:{}", event.external_delivery_id, event.event_name, at.timestamp_millis()),
            None => format!("{}:{}", event.external_delivery_id, event.event_name),
        };

        Ok(DomainEvent::new(
            status.event_type(),
            EndpointType::Delivery,
            self.provider(),
            native_id,
            occurred_at,
            ProviderPayload::DeliveryStatus(DeliveryStatusPayload {
                external_delivery_id: event.external_delivery_id,
                provider_status: event.event_name,
                courier_location: event
                    .dasher_location
                    .map(|l| Coordinates { lat: l.lat, lng: l.lng }),
                courier_name: event.dasher_name,
                pickup_eta: event.pickup_time_estimated,
                dropoff_eta: event.dropoff_time_estimated,
                tracking_url: event.tracking_url,
            }),
        ))
    }
}
