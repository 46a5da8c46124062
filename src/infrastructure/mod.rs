// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域层接口的技术实现：
/// - 数据库（database）：连接池、迁移与实体映射
/// - 指标（metrics）：Prometheus 导出器
/// - 仓库实现（repositories）：基于 SeaORM 的持久化
pub mod database;
pub mod metrics;
pub mod repositories;
