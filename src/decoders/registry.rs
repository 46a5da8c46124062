// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::decoders::doordash::DoorDashDecoder;
use crate::decoders::generic::GenericDecoder;
use crate::decoders::shopify::ShopifyDecoder;
use crate::decoders::traits::PayloadDecoder;
use crate::decoders::uber_direct::UberDirectDecoder;
use crate::decoders::woocommerce::WooCommerceDecoder;
use crate::domain::models::webhook::{normalize_provider, EndpointType};
use std::collections::HashMap;
use std::sync::Arc;

/// 解码器注册表
///
/// 以 (来源类型, 规范化服务商名称) 为键查找解码器。
pub struct DecoderRegistry {
    decoders: HashMap<(EndpointType, String), Arc<dyn PayloadDecoder>>,
}

impl DecoderRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// 注册解码器，对其支持的每种来源类型各登记一次
    pub fn register(&mut self, decoder: Arc<dyn PayloadDecoder>) {
        let provider = normalize_provider(decoder.provider());
        for source_type in decoder.source_types() {
            self.decoders
                .insert((*source_type, provider.clone()), decoder.clone());
        }
    }

    /// 查找解码器
    pub fn get(&self, source_type: EndpointType, provider: &str) -> Option<Arc<dyn PayloadDecoder>> {
        self.decoders
            .get(&(source_type, normalize_provider(provider)))
            .cloned()
    }
}

impl Default for DecoderRegistry {
    /// 内置的全部解码器
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ShopifyDecoder));
        registry.register(Arc::new(WooCommerceDecoder));
        registry.register(Arc::new(UberDirectDecoder));
        registry.register(Arc::new(DoorDashDecoder));
        registry.register(Arc::new(GenericDecoder));
        registry
    }
}
