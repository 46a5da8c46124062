// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::sea_orm_active_enums::{SeaFulfillmentStatus, SeaOrderStatus};
use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub order_number: String,
    pub external_id: Option<String>,
    pub status: SeaOrderStatus,
    pub total_amount: i64,
    pub source: String,
    pub currency: String,
    pub payment_status: String,
    pub fulfillment_status: SeaFulfillmentStatus,
    pub customer: Option<JsonValue>,
    pub dropoff: Option<JsonValue>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
