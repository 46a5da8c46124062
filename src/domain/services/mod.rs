// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 编排桥的各个组件：注册表、接收器、路由器、派单器、状态协调器与重试管理器
pub mod delivery_dispatcher;
pub mod event_router;
pub mod order_ingestion;
pub mod receiver;
pub mod retry_manager;
pub mod status_reconciler;
pub mod webhook_registry;
