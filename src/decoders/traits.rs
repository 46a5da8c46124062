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

use crate::domain::models::event::DomainEvent;
use crate::domain::models::webhook::EndpointType;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use thiserror::Error;

/// 入站请求
///
/// 头名称统一为小写；正文保留原始字节，签名校验基于原始字节进行。
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl InboundRequest {
    pub fn new<I, K, V>(headers: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        Self { headers, body }
    }

    /// 按名称读取请求头（大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 读取必需的请求头
    pub fn require_header(&self, name: &'static str) -> Result<&str, DecodeError> {
        self.header(name).ok_or(DecodeError::MissingHeader(name))
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 以 UTF-8 文本形式读取正文，非法字节被替换
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 将正文解析为 JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_slice(&self.body).map_err(|e| DecodeError::InvalidBody(e.to_string()))
    }
}

/// 解码错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// 缺少必需的请求头
    #[error("Missing header {0}")]
    MissingHeader(&'static str),

    /// 正文无法解析
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// 无法映射到已知事件类型的主题或状态
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// 签名缺失或不匹配
    #[error("Signature verification failed")]
    InvalidSignature,
}

/// 负载解码器特征
///
/// 每个解码器把一个服务商的原生负载翻译为 [`DomainEvent`]，
/// 与服务商相关的知识仅存在于解码器之内。
pub trait PayloadDecoder: Send + Sync {
    /// 服务商名称
    fn provider(&self) -> &str;

    /// 支持的来源类型
    fn source_types(&self) -> &[EndpointType];

    /// 解码入站请求
    fn decode(&self, request: &InboundRequest) -> Result<DomainEvent, DecodeError>;

    /// 使用服务商签名密钥校验请求，未实现签名的服务商始终通过
    fn verify_signature(&self, _request: &InboundRequest, _secret: &str) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// 校验 base64 编码的 HMAC-SHA256 签名（常量时间比较）
pub fn verify_base64_hmac(secret: &str, body: &[u8], signature: &str) -> Result<(), DecodeError> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| DecodeError::InvalidSignature)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| DecodeError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| DecodeError::InvalidSignature)
}

#[cfg(test)]
pub(crate) fn sign_base64(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
