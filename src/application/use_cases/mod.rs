// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 一次采集运行的完整流程
pub mod harvest_use_case;
/// 不联网的离线模式：从WARC提取正文、重新过滤已有文档
pub mod refine_use_case;

pub use harvest_use_case::{run_from_settings, HarvestEngine, RunOptions, RunState, RunSummary};
pub use refine_use_case::{clean_documents, extract_archive, run_offline, RefineJob};
