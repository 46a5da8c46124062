// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::domain::errors::BridgeError;
use crate::utils::errors::RepositoryError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 根据错误类型选择HTTP状态码
    pub fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<BridgeError>() {
            return bridge_status(err);
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }
        if self.0.downcast_ref::<validator::ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn bridge_status(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
        // 不区分“不存在”与“未启用”，避免泄露Webhook是否存在
        BridgeError::NotFound(_) | BridgeError::Authentication => StatusCode::NOT_FOUND,
        BridgeError::UnsupportedProvider { .. } | BridgeError::Decode(_) => {
            StatusCode::BAD_REQUEST
        }
        BridgeError::IncompleteOrderData(_) | BridgeError::UnknownDelivery { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BridgeError::InvalidTransition(_) => StatusCode::CONFLICT,
        BridgeError::Provider(_) => StatusCode::BAD_GATEWAY,
        BridgeError::Repository(e) => repository_status(e),
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::AlreadyExists => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::Corrupt(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            error!("Internal error: {:#}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
