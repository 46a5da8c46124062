// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::webhook::{normalize_provider, EventType};
use thiserror::Error;
use url::Url;

/// 验证错误类型
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// URL无效
    #[error("endpoint_url must be an absolute http(s) URL")]
    InvalidUrl,
    /// 必填字段为空
    #[error("{0} must not be empty")]
    Empty(&'static str),
    /// 服务商名称中没有可用字符
    #[error("{0} must contain at least one letter or digit")]
    InvalidProvider(&'static str),
}

/// 验证端点URL
///
/// # 参数
///
/// * `url` - URL字符串
///
/// # 返回值
///
/// * `Ok(())` - URL为带主机名的 http/https 地址
/// * `Err(ValidationError)` - URL无效
pub fn validate_endpoint_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl);
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// 验证非空文本字段
pub fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

/// 验证服务商名称
pub fn validate_provider(field: &'static str, value: &str) -> Result<(), ValidationError> {
    validate_non_empty(field, value)?;
    if normalize_provider(value).is_empty() {
        return Err(ValidationError::InvalidProvider(field));
    }
    Ok(())
}

/// 验证订阅的事件类型集合
pub fn validate_event_types(event_types: &[EventType]) -> Result<(), ValidationError> {
    if event_types.is_empty() {
        Err(ValidationError::Empty("event_types"))
    } else {
        Ok(())
    }
}
