// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod api_test;
pub mod receiver_test;
pub mod registry_test;
pub mod repositories;
pub mod retry_flow_test;
pub mod status_flow_test;
