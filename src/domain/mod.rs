// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：Webhook定义、领域事件、订单、配送与日志
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：接收、路由、派单、协调与重试
/// - 错误（errors）：编排桥的错误分类
///
/// 领域层不依赖于任何具体的存储或HTTP实现。
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
