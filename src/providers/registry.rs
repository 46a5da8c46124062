// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::normalize_provider;
use crate::providers::traits::DeliveryProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 配送服务商注册表
///
/// 以规范化后的服务商名称为键，支持运行期注册。
#[derive(Default)]
pub struct ProviderRegistry {
    providers: parking_lot::RwLock<HashMap<String, Arc<dyn DeliveryProvider>>>,
}

impl ProviderRegistry {
    /// 创建注册表
    ///
    /// # 参数
    ///
    /// * `providers` - 服务商列表
    pub fn new(providers: Vec<Arc<dyn DeliveryProvider>>) -> Self {
        let registry = Self::default();
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    /// 注册或替换服务商
    pub fn register(&self, provider: Arc<dyn DeliveryProvider>) {
        let key = normalize_provider(provider.name());
        info!("Registered delivery provider {}", provider.name());
        self.providers.write().insert(key, provider);
    }

    /// 按名称获取服务商
    pub fn get(&self, name: &str) -> Option<Arc<dyn DeliveryProvider>> {
        self.providers.read().get(&normalize_provider(name)).cloned()
    }

    /// 已注册的服务商名称
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .values()
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        names
    }
}
