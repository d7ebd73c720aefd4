// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 运行协调：把队列、工作器、处理阶段和写入端组装成一次采集运行
pub mod use_cases;
