// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置，包括运行、抓取和内容过滤配置
pub mod settings;

pub use settings::{FetchTimeouts, HarvestMode, Settings};
