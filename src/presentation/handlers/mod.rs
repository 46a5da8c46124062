// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// - inbound_handler：服务商回调入口
/// - webhook_handler：Webhook定义管理与日志查询
pub mod inbound_handler;
pub mod webhook_handler;
