// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于SeaORM实现领域层的仓库接口，同一套实现同时用于 PostgreSQL 与 SQLite。
pub mod delivery_repo_impl;
pub mod dispatch_job_repo_impl;
pub mod order_repo_impl;
pub mod webhook_log_repo_impl;
pub mod webhook_repo_impl;

use crate::utils::errors::RepositoryError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

fn to_json<T: Serialize>(value: &T) -> Result<JsonValue, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Corrupt(e.to_string()))
}

fn from_json<T: DeserializeOwned>(value: JsonValue) -> Result<T, RepositoryError> {
    serde_json::from_value(value).map_err(|e| RepositoryError::Corrupt(e.to_string()))
}

fn from_json_opt<T: DeserializeOwned>(value: Option<JsonValue>) -> Result<Option<T>, RepositoryError> {
    value.map(from_json).transpose()
}
