// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::sea_orm_active_enums::SeaLogStatus;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "webhook_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub webhook_id: Uuid,
    pub idempotency_key: Option<String>,
    pub event_type: Option<String>,
    pub status: SeaLogStatus,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub response_status: Option<i32>,
    pub error_message: Option<String>,
    pub note: Option<String>,
    pub replay_of: Option<Uuid>,
    pub attempt_count: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
