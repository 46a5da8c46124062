// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::traits::{verify_base64_hmac, DecodeError, InboundRequest, PayloadDecoder};
use crate::domain::models::event::{DomainEvent, LineItem, OrderPayload, ProviderPayload};
use crate::domain::models::location::{Address, Contact};
use crate::domain::models::webhook::{EndpointType, EventType};
use crate::utils::money::{minor_units_from_json, parse_minor_units};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

const TOPIC_HEADER: &str = "x-wc-webhook-topic";
const DELIVERY_ID_HEADER: &str = "x-wc-webhook-delivery-id";
const SIGNATURE_HEADER: &str = "x-wc-webhook-signature";

/// WooCommerce 订单 Webhook 解码器
pub struct WooCommerceDecoder;

#[derive(Debug, Deserialize)]
struct WooOrder {
    id: Option<i64>,
    number: Option<String>,
    status: Option<String>,
    currency: Option<String>,
    total: Option<String>,
    date_modified_gmt: Option<String>,
    date_paid_gmt: Option<String>,
    billing: Option<WooContact>,
    shipping: Option<WooContact>,
    #[serde(default)]
    line_items: Vec<WooLineItem>,
    customer_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WooContact {
    first_name: Option<String>,
    last_name: Option<String>,
    address_1: Option<String>,
    address_2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl WooContact {
    fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }

    fn has_address(&self) -> bool {
        self.address_1.as_deref().is_some_and(|s| !s.is_empty())
    }

    fn address(&self) -> Address {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Address {
            line1: self.address_1.clone().unwrap_or_default(),
            line2: non_empty(&self.address_2),
            city: self.city.clone().unwrap_or_default(),
            region: non_empty(&self.state),
            postal_code: non_empty(&self.postcode),
            country: non_empty(&self.country),
            coordinates: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WooLineItem {
    name: Option<String>,
    quantity: Option<u32>,
    price: Option<serde_json::Value>,
}

impl WooCommerceDecoder {
    fn event_type(topic: &str, order: &WooOrder) -> Result<EventType, DecodeError> {
        let cancelled = matches!(order.status.as_deref(), Some("cancelled"));
        match topic {
            "order.created" => Ok(EventType::OrderCreated),
            "order.updated" if cancelled => Ok(EventType::OrderCancelled),
            "order.updated" | "order.restored" => Ok(EventType::OrderUpdated),
            "order.deleted" => Ok(EventType::OrderCancelled),
            other => Err(DecodeError::UnknownEvent(other.to_string())),
        }
    }

    fn to_payload(order: WooOrder) -> Result<OrderPayload, DecodeError> {
        let order_number = order
            .number
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| order.id.map(|id| id.to_string()))
            .ok_or_else(|| DecodeError::InvalidBody("order has no number or id".to_string()))?;

        let billing = order.billing.unwrap_or_default();
        let shipping = order.shipping.unwrap_or_default();

        // shipping carries the recipient; billing is the fallback for both address and contact
        let dropoff_source = if shipping.has_address() { &shipping } else { &billing };
        let dropoff = dropoff_source.has_address().then(|| dropoff_source.address());
        let customer = dropoff_source
            .full_name()
            .or_else(|| billing.full_name())
            .map(|name| Contact {
                name,
                phone: dropoff_source.phone.clone().or_else(|| billing.phone.clone()),
                email: billing.email.clone(),
            });

        let items = order
            .line_items
            .into_iter()
            .map(|item| LineItem {
                name: item.name.unwrap_or_default(),
                quantity: item.quantity.unwrap_or(1),
                unit_price: item.price.as_ref().and_then(minor_units_from_json),
            })
            .collect();

        let payment_status = match (order.date_paid_gmt.as_deref(), order.status.as_deref()) {
            (Some(_), _) => Some("paid".to_string()),
            (None, Some(status)) => Some(status.to_string()),
            (None, None) => None,
        };

        Ok(OrderPayload {
            order_number,
            external_id: order.id.map(|id| id.to_string()),
            total_amount: order.total.as_deref().and_then(parse_minor_units),
            currency: order.currency,
            payment_status,
            customer,
            dropoff,
            pickup: None,
            items,
            notes: order.customer_note.filter(|n| !n.is_empty()),
        })
    }
}

impl PayloadDecoder for WooCommerceDecoder {
    fn provider(&self) -> &str {
        "woocommerce"
    }

    fn source_types(&self) -> &[EndpointType] {
        &[EndpointType::Ecommerce]
    }

    fn decode(&self, request: &InboundRequest) -> Result<DomainEvent, DecodeError> {
        let topic = request.require_header(TOPIC_HEADER)?;
        let native_id = request.require_header(DELIVERY_ID_HEADER)?.to_string();

        let order: WooOrder = request.json()?;
        let event_type = Self::event_type(topic, &order)?;
        // WooCommerce reports GMT timestamps without an offset
        let occurred_at = order
            .date_modified_gmt
            .as_deref()
            .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S").ok())
            .map(|t| DateTime::<Utc>::from_naive_utc_and_offset(t, Utc))
            .unwrap_or_else(Utc::now);
        let payload = Self::to_payload(order)?;

        Ok(DomainEvent::new(
            event_type,
            EndpointType::Ecommerce,
            self.provider(),
            native_id,
            occurred_at,
            ProviderPayload::Order(payload),
        ))
    }

    fn verify_signature(&self, request: &InboundRequest, secret: &str) -> Result<(), DecodeError> {
        let signature = request
            .header(SIGNATURE_HEADER)
            .ok_or(DecodeError::InvalidSignature)?;
        verify_base64_hmac(secret, request.body(), signature)
    }
}
