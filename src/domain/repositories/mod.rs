// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供，测试中以内存实现替代。
///
/// 包含的仓库接口：
/// - Webhook仓库（webhook_repository）：管理Webhook定义
/// - Webhook日志仓库（webhook_log_repository）：只追加的审计日志
/// - 订单仓库（order_repository）
/// - 配送仓库（delivery_repository）：含按行加锁的状态更新
/// - 派发任务仓库（dispatch_job_repository）：重试调度
///
/// 所有读写都按租户限定范围。
pub mod delivery_repository;
pub mod dispatch_job_repository;
pub mod order_repository;
pub mod webhook_log_repository;
pub mod webhook_repository;
