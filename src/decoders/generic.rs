// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::traits::{DecodeError, InboundRequest, PayloadDecoder};
use crate::domain::models::event::{DomainEvent, OpaquePayload, ProviderPayload};
use crate::domain::models::webhook::{EndpointType, EventType};
use chrono::Utc;

const EVENT_TYPE_HEADER: &str = "x-event-type";
const EVENT_ID_HEADER: &str = "x-event-id";

/// 通用解码器
///
/// 服务商名称为 `custom`，事件类型与ID取自请求头，正文作为不透明负载原样携带。
pub struct GenericDecoder;

impl PayloadDecoder for GenericDecoder {
    fn provider(&self) -> &str {
        "custom"
    }

    fn source_types(&self) -> &[EndpointType] {
        &[EndpointType::Ecommerce, EndpointType::Delivery]
    }

    fn decode(&self, request: &InboundRequest) -> Result<DomainEvent, DecodeError> {
        let raw_type = request.require_header(EVENT_TYPE_HEADER)?;
        let event_type: EventType = raw_type
            .parse()
            .map_err(|_| DecodeError::UnknownEvent(raw_type.to_string()))?;
        let native_id = request.require_header(EVENT_ID_HEADER)?;

        let source_type = if event_type.is_order_event() {
            EndpointType::Ecommerce
        } else {
            EndpointType::Delivery
        };

        Ok(DomainEvent::new(
            event_type,
            source_type,
            self.provider(),
            native_id,
            Utc::now(),
            ProviderPayload::Opaque(OpaquePayload {
                content_type: request.content_type().map(str::to_string),
                body: request.body().to_vec(),
            }),
        ))
    }
}
