// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 使用SeaORM框架定义表结构映射。
/// 地址、联系人等嵌套值以 JSON 列存储，状态字段使用字符串枚举。
pub mod delivery;
pub mod dispatch_job;
pub mod order;
pub mod sea_orm_active_enums;
pub mod webhook;
pub mod webhook_log;
