// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 运行协调器与运行生命周期
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心实体与内容管道服务
pub mod domain;

/// 引擎模块
///
/// 实现HTTP抓取引擎与单主机连接上限
pub mod engines;

/// 基础设施模块
///
/// 提供指标导出和输出文件写入
pub mod infrastructure;

/// 队列模块
///
/// URL源与有界工作队列
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 抓取工作器、CPU卸载池、结果写入端与进度报告
pub mod workers;
