// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::event::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 派发任务
///
/// 瞬时失败后交给重试管理器的待重试工作。与只追加的日志不同，
/// 任务行是可变的调度状态；每次尝试的结果仍以新日志行记录。
/// 同一 Webhook 与幂等键至多对应一个任务。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 所属租户ID
    pub owner_id: Uuid,
    /// 目标Webhook定义ID
    pub webhook_id: Uuid,
    /// 事件幂等键，重试沿用同一个键
    pub idempotency_key: String,
    /// 原始领域事件
    pub event: DomainEvent,
    /// 任务状态
    pub status: DispatchJobStatus,
    /// 已尝试次数
    pub attempt_count: i32,
    /// 最大尝试次数
    pub max_attempts: i32,
    /// 下次重试时间
    pub next_retry_at: Option<DateTime<Utc>>,
    /// 最近一次错误
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DispatchJob {
    /// 为首次瞬时失败创建任务
    pub fn new(
        owner_id: Uuid,
        webhook_id: Uuid,
        event: DomainEvent,
        attempt_count: u32,
        max_attempts: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            webhook_id,
            idempotency_key: event.idempotency_key().to_string(),
            event,
            status: DispatchJobStatus::Pending,
            attempt_count: attempt_count as i32,
            max_attempts: max_attempts as i32,
            next_retry_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 下一次尝试的序号
    pub fn next_attempt(&self) -> u32 {
        self.attempt_count.max(0) as u32 + 1
    }
}

/// 派发任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchJobStatus {
    /// 等待重试
    #[default]
    Pending,
    /// 已成功
    Succeeded,
    /// 已放弃，需要人工介入
    Dead,
}

impl fmt::Display for DispatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchJobStatus::Pending => write!(f, "pending"),
            DispatchJobStatus::Succeeded => write!(f, "succeeded"),
            DispatchJobStatus::Dead => write!(f, "dead"),
        }
    }
}

impl FromStr for DispatchJobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DispatchJobStatus::Pending),
            "succeeded" => Ok(DispatchJobStatus::Succeeded),
            "dead" => Ok(DispatchJobStatus::Dead),
            _ => Err(()),
        }
    }
}
