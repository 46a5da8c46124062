// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// 记录未找到
    #[error("Record not found")]
    NotFound,

    /// 违反唯一约束
    #[error("Record already exists")]
    AlreadyExists,

    /// 存储数据无法还原为领域对象
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    /// 将数据库唯一约束冲突识别为 [`RepositoryError::AlreadyExists`]
    pub fn from_insert(err: DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => RepositoryError::AlreadyExists,
            _ => RepositoryError::Database(err),
        }
    }
}
