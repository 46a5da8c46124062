// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::traits::DecodeError;
use crate::domain::models::delivery::InvalidTransition;
use crate::domain::models::webhook::EndpointType;
use crate::providers::traits::ProviderError;
use crate::utils::errors::RepositoryError;
use crate::utils::validators::ValidationError;
use thiserror::Error;

/// 编排桥错误类型
///
/// 校验与认证错误同步返回给调用方；瞬时服务商错误由重试管理器吸收；
/// 永久性业务错误写入订单/配送状态与日志，通过正常读取可见。
#[derive(Error, Debug)]
pub enum BridgeError {
    /// 输入不合法，永不重试
    #[error("Validation error: {0}")]
    Validation(String),

    /// 记录不存在或不在当前租户范围内
    #[error("Not found: {0}")]
    NotFound(String),

    /// 未识别或未启用的 Webhook 密钥
    #[error("Unknown webhook")]
    Authentication,

    /// 没有注册对应的解码器或服务商能力
    #[error("Unsupported provider {provider} for {endpoint_type}")]
    UnsupportedProvider {
        endpoint_type: EndpointType,
        provider: String,
    },

    /// 负载解析失败
    #[error("Invalid payload: {0}")]
    Decode(String),

    /// 订单数据不完整，需要人工修复来源数据
    #[error("Incomplete order data: {0}")]
    IncompleteOrderData(String),

    /// 回调引用了未知的配送
    #[error("Unknown delivery {external_id} for provider {provider}")]
    UnknownDelivery {
        provider: String,
        external_id: String,
    },

    /// 服务商调用失败
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 非前进的配送状态转换
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<ValidationError> for BridgeError {
    fn from(err: ValidationError) -> Self {
        BridgeError::Validation(err.to_string())
    }
}

impl From<DecodeError> for BridgeError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidSignature => BridgeError::Authentication,
            other => BridgeError::Decode(other.to_string()),
        }
    }
}

impl BridgeError {
    /// 是否应交由重试管理器处理
    pub fn is_transient(&self) -> bool {
        match self {
            BridgeError::Provider(e) => e.is_transient(),
            _ => false,
        }
    }
}
