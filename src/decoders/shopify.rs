// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::traits::{verify_base64_hmac, DecodeError, InboundRequest, PayloadDecoder};
use crate::domain::models::event::{DomainEvent, LineItem, OrderPayload, ProviderPayload};
use crate::domain::models::location::{Address, Contact, Coordinates};
use crate::domain::models::webhook::{EndpointType, EventType};
use crate::utils::money::parse_minor_units;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const TOPIC_HEADER: &str = "x-shopify-topic";
const WEBHOOK_ID_HEADER: &str = "x-shopify-webhook-id";
const EVENT_ID_HEADER: &str = "x-shopify-event-id";
const TRIGGERED_AT_HEADER: &str = "x-shopify-triggered-at";
const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Shopify 订单 Webhook 解码器
pub struct ShopifyDecoder;

#[derive(Debug, Deserialize)]
struct ShopifyOrder {
    id: Option<serde_json::Value>,
    name: Option<String>,
    order_number: Option<serde_json::Value>,
    total_price: Option<String>,
    currency: Option<String>,
    financial_status: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    customer: Option<ShopifyCustomer>,
    shipping_address: Option<ShopifyAddress>,
    #[serde(default)]
    line_items: Vec<ShopifyLineItem>,
    note: Option<String>,
    cancelled_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShopifyCustomer {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShopifyAddress {
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    province: Option<String>,
    zip: Option<String>,
    country: Option<String>,
    phone: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ShopifyLineItem {
    title: Option<String>,
    name: Option<String>,
    quantity: Option<u32>,
    price: Option<String>,
}

fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ShopifyDecoder {
    fn event_type(topic: &str, order: &ShopifyOrder) -> Result<EventType, DecodeError> {
        match topic {
            "orders/create" => Ok(EventType::OrderCreated),
            "orders/cancelled" => Ok(EventType::OrderCancelled),
            "orders/updated" | "orders/edited" | "orders/paid" | "orders/fulfilled" => {
                if order.cancelled_at.is_some() {
                    Ok(EventType::OrderCancelled)
                } else {
                    Ok(EventType::OrderUpdated)
                }
            }
            other => Err(DecodeError::UnknownEvent(other.to_string())),
        }
    }

    fn to_payload(order: ShopifyOrder) -> Result<OrderPayload, DecodeError> {
        let order_number = order
            .name
            .as_deref()
            .map(|n| n.trim_start_matches('#').to_string())
            .filter(|n| !n.is_empty())
            .or_else(|| order.order_number.as_ref().and_then(value_to_string))
            .or_else(|| order.id.as_ref().and_then(value_to_string))
            .ok_or_else(|| DecodeError::InvalidBody("order has no name or id".to_string()))?;

        let customer_name = order
            .customer
            .as_ref()
            .and_then(|c| join_name(c.first_name.as_deref(), c.last_name.as_deref()));

        let (dropoff, recipient) = match order.shipping_address {
            Some(address) => {
                let recipient_name = address.name.clone().or_else(|| {
                    join_name(address.first_name.as_deref(), address.last_name.as_deref())
                });
                let coordinates = match (address.latitude, address.longitude) {
                    (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
                    _ => None,
                };
                let dropoff = Address {
                    line1: address.address1.unwrap_or_default(),
                    line2: address.address2.filter(|s| !s.is_empty()),
                    city: address.city.unwrap_or_default(),
                    region: address.province,
                    postal_code: address.zip,
                    country: address.country,
                    coordinates,
                };
                (Some(dropoff), recipient_name.map(|n| (n, address.phone)))
            }
            None => (None, None),
        };

        let customer_phone = order
            .customer
            .as_ref()
            .and_then(|c| c.phone.clone())
            .or(order.phone);
        let customer_email = order
            .customer
            .as_ref()
            .and_then(|c| c.email.clone())
            .or(order.email);

        let customer = match (recipient, customer_name) {
            (Some((name, phone)), _) => Some(Contact {
                name,
                phone: phone.or(customer_phone),
                email: customer_email,
            }),
            (None, Some(name)) => Some(Contact {
                name,
                phone: customer_phone,
                email: customer_email,
            }),
            (None, None) => None,
        };

        let items = order
            .line_items
            .into_iter()
            .map(|item| LineItem {
                name: item.title.or(item.name).unwrap_or_default(),
                quantity: item.quantity.unwrap_or(1),
                unit_price: item.price.as_deref().and_then(parse_minor_units),
            })
            .collect();

        Ok(OrderPayload {
            order_number,
            external_id: order.id.as_ref().and_then(value_to_string),
            total_amount: order.total_price.as_deref().and_then(parse_minor_units),
            currency: order.currency,
            payment_status: order.financial_status,
            customer,
            dropoff,
            pickup: None,
            items,
            notes: order.note.filter(|n| !n.is_empty()),
        })
    }
}

impl PayloadDecoder for ShopifyDecoder {
    fn provider(&self) -> &str {
        "shopify"
    }

    fn source_types(&self) -> &[EndpointType] {
        &[EndpointType::Ecommerce]
    }

    fn decode(&self, request: &InboundRequest) -> Result<DomainEvent, DecodeError> {
        let topic = request.require_header(TOPIC_HEADER)?;
        let native_id = request
            .header(WEBHOOK_ID_HEADER)
            .or_else(|| request.header(EVENT_ID_HEADER))
            .ok_or(DecodeError::MissingHeader(WEBHOOK_ID_HEADER))?
            .to_string();
        let occurred_at = request
            .header(TRIGGERED_AT_HEADER)
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let order: ShopifyOrder = request.json()?;
        let event_type = Self::event_type(topic, &order)?;
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
            .header(HMAC_HEADER)
            .ok_or(DecodeError::InvalidSignature)?;
        verify_base64_hmac(secret, request.body(), signature)
    }
}
