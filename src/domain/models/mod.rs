// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - Webhook定义（webhook）：来源到目标的事件订阅
/// - Webhook日志（webhook_log）：每次处理尝试的只追加审计记录
/// - 领域事件（event）：入站通知的统一表示
/// - 订单（order）与配送（delivery）：派单与状态协调的对象
/// - 派发任务（dispatch_job）：重试管理器的调度状态
///
/// 所有实体都归属于唯一的租户。
pub mod delivery;
pub mod dispatch_job;
pub mod event;
pub mod location;
pub mod order;
pub mod webhook;
pub mod webhook_log;
