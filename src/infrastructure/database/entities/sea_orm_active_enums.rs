// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::DeliveryStatus;
use crate::domain::models::dispatch_job::DispatchJobStatus;
use crate::domain::models::order::{FulfillmentStatus, OrderStatus};
use crate::domain::models::webhook::EndpointType;
use crate::domain::models::webhook_log::LogStatus;
use sea_orm::entity::prelude::*;

/// 为数据库枚举与领域枚举生成双向转换
macro_rules! mirror_enum {
    ($sea:ident <=> $domain:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$domain> for $sea {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => $sea::$variant,)+
                }
            }
        }

        impl From<$sea> for $domain {
            fn from(value: $sea) -> Self {
                match value {
                    $($sea::$variant => $domain::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaEndpointType {
    #[sea_orm(string_value = "ecommerce")]
    Ecommerce,
    #[sea_orm(string_value = "delivery")]
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaLogStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaOrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "out_for_delivery")]
    OutForDelivery,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaFulfillmentStatus {
    #[sea_orm(string_value = "unfulfilled")]
    Unfulfilled,
    #[sea_orm(string_value = "dispatched")]
    Dispatched,
    #[sea_orm(string_value = "dispatch_failed")]
    DispatchFailed,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "fulfilled")]
    Fulfilled,
    #[sea_orm(string_value = "delivery_cancelled")]
    DeliveryCancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaDeliveryStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaDispatchJobStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "dead")]
    Dead,
}

mirror_enum!(SeaEndpointType <=> EndpointType { Ecommerce, Delivery });
mirror_enum!(SeaLogStatus <=> LogStatus { Pending, Success, Failed });
mirror_enum!(SeaOrderStatus <=> OrderStatus {
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
    Cancelled,
});
mirror_enum!(SeaFulfillmentStatus <=> FulfillmentStatus {
    Unfulfilled,
    Dispatched,
    DispatchFailed,
    InTransit,
    Fulfilled,
    DeliveryCancelled,
});
mirror_enum!(SeaDeliveryStatus <=> DeliveryStatus {
    Created,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
});
mirror_enum!(SeaDispatchJobStatus <=> DispatchJobStatus { Pending, Succeeded, Dead });
