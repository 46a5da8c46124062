// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::sea_orm_active_enums::SeaDeliveryStatus;
use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub order_id: Option<Uuid>,
    pub integration_id: Option<Uuid>,
    pub provider: String,
    pub external_id: Option<String>,
    pub status: SeaDeliveryStatus,
    pub pickup_address: JsonValue,
    pub pickup_contact: Option<JsonValue>,
    pub dropoff_address: JsonValue,
    pub dropoff_contact: Option<JsonValue>,
    #[sea_orm(column_type = "Double", nullable)]
    pub current_lat: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub current_lng: Option<f64>,
    pub pickup_eta: Option<DateTimeWithTimeZone>,
    pub dropoff_eta: Option<DateTimeWithTimeZone>,
    pub fee: Option<i64>,
    pub currency: Option<String>,
    pub tracking_url: Option<String>,
    pub metadata: JsonValue,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
