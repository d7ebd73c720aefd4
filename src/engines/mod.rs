// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod host_limiter;
pub mod reqwest_engine;
pub mod traits;

pub use host_limiter::HostLimiter;
pub use reqwest_engine::{EngineConfig, ReqwestEngine};
pub use traits::FetchEngine;
