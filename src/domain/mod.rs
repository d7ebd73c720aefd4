// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：URL任务、抓取结果、文档和运行统计
/// - 服务（services）：文本提取、分类、质量过滤和脱敏
pub mod models;
pub mod services;
