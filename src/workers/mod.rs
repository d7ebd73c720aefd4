// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 抓取工作器、工作器生命周期管理、CPU卸载池、结果写入端与进度报告
pub mod fetch_worker;
pub mod manager;
pub mod offload_pool;
pub mod progress;
pub mod result_sink;
pub mod stage;

pub use fetch_worker::FetchWorker;
pub use manager::WorkerManager;
pub use offload_pool::OffloadPool;
pub use progress::ProgressReporter;
pub use result_sink::ResultSink;
pub use stage::{ArchiveStage, ContentStage, ProcessingStage};
