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

/// Uber Direct 配送状态回调解码器
pub struct UberDirectDecoder;

#[derive(Debug, Deserialize)]
struct UberEvent {
    id: String,
    kind: Option<String>,
    created: Option<DateTime<Utc>>,
    delivery_id: Option<String>,
    status: Option<String>,
    #[serde(default)]
    data: UberDelivery,
}

#[derive(Debug, Default, Deserialize)]
struct UberDelivery {
    id: Option<String>,
    status: Option<String>,
    courier: Option<UberCourier>,
    pickup_eta: Option<DateTime<Utc>>,
    dropoff_eta: Option<DateTime<Utc>>,
    tracking_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UberCourier {
    name: Option<String>,
    location: Option<Coordinates>,
}

impl PayloadDecoder for UberDirectDecoder {
    fn provider(&self) -> &str {
        "uber_direct"
    }

    fn source_types(&self) -> &[EndpointType] {
        &[EndpointType::Delivery]
    }

    fn decode(&self, request: &InboundRequest) -> Result<DomainEvent, DecodeError> {
        let event: UberEvent = request.json()?;
        tracing::trace!("Decoding Uber Direct {:?} event {}", event.kind, event.id);

        let external_delivery_id = event
            .delivery_id
            .or(event.data.id)
            .ok_or_else(|| DecodeError::InvalidBody("missing delivery_id".to_string()))?;
        let provider_status = event
            .status
            .or(event.data.status)
            .ok_or_else(|| DecodeError::InvalidBody("missing status".to_string()))?;
        let status = map_provider_status(self.provider(), &provider_status)
            .ok_or_else(|| DecodeError::UnknownEvent(provider_status.clone()))?;

        let (courier_name, courier_location) = match event.data.courier {
            Some(courier) => (courier.name, courier.location),
            None => (None, None),
        };

        Ok(DomainEvent::new(
            status.event_type(),
            EndpointType::Delivery,
            self.provider(),
            event.id,
            event.created.unwrap_or_else(Utc::now),
            ProviderPayload::DeliveryStatus(DeliveryStatusPayload {
                external_delivery_id,
                provider_status,
                courier_location,
                courier_name,
                pickup_eta: event.data.pickup_eta,
                dropoff_eta: event.data.dropoff_eta,
                tracking_url: event.data.tracking_url,
            }),
        ))
    }
}
