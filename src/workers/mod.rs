// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 后台重试工作器，驱动瞬时失败任务的有界重试
pub mod retry_worker;

pub use retry_worker::{RetryWorker, RetryWorkerConfig};
