// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 地理坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// 纬度
    pub lat: f64,
    /// 经度
    pub lng: f64,
}

/// 地址
///
/// 取货与送达地址的统一表示，同时用于订单快照和配送请求。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Address {
    /// 返回缺失的必填字段名称
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.line1.trim().is_empty() {
            missing.push("line1");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        missing
    }

    /// 单行格式，供配送服务商使用
    pub fn one_line(&self) -> String {
        let mut parts: Vec<&str> = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|s| !s.is_empty()) {
            parts.push(line2);
        }
        parts.push(self.city.as_str());
        for part in [&self.region, &self.postal_code, &self.country]
            .into_iter()
            .flatten()
        {
            if !part.is_empty() {
                parts.push(part.as_str());
            }
        }
        parts.join(", ")
    }
}

/// 联系人
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Contact {
    /// 配送所需的联系人字段：姓名与电话
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.phone.as_deref().map_or(true, |p| p.trim().is_empty()) {
            missing.push("phone");
        }
        missing
    }
}

/// 取货点
///
/// 门店地址与联系人，可配置在 Webhook 定义上，也可由订单负载携带。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub name: String,
    pub address: Address,
    pub contact: Contact,
}
