// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心数据实体，包括：
/// - URL任务（task）：一次抓取工作单元及队列元素
/// - 抓取结果（fetch）：成功页面与失败分类
/// - 文档（document）：内容管道的输出
/// - 运行统计（run_stats）：进度与错误计数
pub mod document;
pub mod fetch;
pub mod run_stats;
pub mod task;

pub use document::{CleanedDocument, ProcessedDocument, RejectKind, StoredDocument};
pub use fetch::{FailureKind, FetchFailure, FetchedPage};
pub use run_stats::{Outcome, RunStats, StatsSnapshot};
pub use task::{UrlTask, WorkItem};
