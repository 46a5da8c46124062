// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod doordash;
pub mod generic;
pub mod registry;
pub mod shopify;
pub mod traits;
pub mod uber_direct;
pub mod woocommerce;
