// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_stats::RunStats;
use crate::engines::traits::FetchEngine;
use crate::queue::work_queue::QueueConsumer;
use crate::workers::fetch_worker::FetchWorker;
use crate::workers::stage::ProcessingStage;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 负责启动固定数量的抓取工作器，并在结束时等待或中止它们。
pub struct WorkerManager<S: ProcessingStage> {
    engine: Arc<dyn FetchEngine>,
    stage: Arc<S>,
    results: mpsc::Sender<S::Output>,
    stats: Arc<RunStats>,
    deadline: Duration,
    handles: Vec<JoinHandle<usize>>,
}

impl<S: ProcessingStage> WorkerManager<S> {
    pub fn new(
        engine: Arc<dyn FetchEngine>,
        stage: Arc<S>,
        results: mpsc::Sender<S::Output>,
        stats: Arc<RunStats>,
        deadline: Duration,
    ) -> Self {
        Self {
            engine,
            stage,
            results,
            stats,
            deadline,
            handles: Vec::new(),
        }
    }

    /// 启动工作器
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作器数量
    /// * `queue` - 共享的队列消费端
    pub fn start_workers(&mut self, count: usize, queue: &QueueConsumer) {
        for _ in 0..count {
            let worker = FetchWorker::new(
                self.handles.len(),
                self.engine.clone(),
                self.stage.clone(),
                self.results.clone(),
                self.stats.clone(),
                self.deadline,
            );
            let queue = queue.clone();
            self.handles
                .push(tokio::spawn(async move { worker.run(queue).await }));
        }
        info!(
            "Started {} workers using the {} engine",
            count,
            self.engine.name()
        );
    }

    /// 运行中的工作器数量
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// 等待所有工作器退出
    ///
    /// 释放管理器持有的结果发送端，使写入端可以在工作器结束后完成。
    ///
    /// # 返回值
    ///
    /// 所有工作器处理的任务总数
    pub async fn join(self) -> usize {
        let Self {
            results, handles, ..
        } = self;
        drop(results);

        let mut handled = 0;
        for result in join_all(handles).await {
            match result {
                Ok(count) => handled += count,
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!("Worker task failed: {}", e),
            }
        }
        handled
    }

    /// 中止所有工作器
    pub fn abort_all(&self) {
        info!("Aborting {} workers", self.handles.len());
        for handle in &self.handles {
            handle.abort();
        }
    }
}
