// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::document::RejectKind;
use crate::domain::models::fetch::{FailureKind, FetchFailure};
use crate::domain::models::run_stats::{Outcome, RunStats};
use crate::domain::models::task::{UrlTask, WorkItem};
use crate::engines::traits::FetchEngine;
use crate::queue::work_queue::QueueConsumer;
use crate::workers::stage::ProcessingStage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

/// 单次尝试的结果
enum Attempt<T> {
    /// 产出待写入的结果
    Output(T),
    /// 已有终态，不需要写入
    Done(Outcome),
}

/// 抓取工作器
///
/// 从队列取任务，在外层截止时间内完成抓取与处理，再把结果交给写入端。
/// 收到结束哨兵或队列关闭时退出。
pub struct FetchWorker<S: ProcessingStage> {
    id: usize,
    engine: Arc<dyn FetchEngine>,
    stage: Arc<S>,
    results: mpsc::Sender<S::Output>,
    stats: Arc<RunStats>,
    deadline: Duration,
}

impl<S: ProcessingStage> FetchWorker<S> {
    pub fn new(
        id: usize,
        engine: Arc<dyn FetchEngine>,
        stage: Arc<S>,
        results: mpsc::Sender<S::Output>,
        stats: Arc<RunStats>,
        deadline: Duration,
    ) -> Self {
        Self {
            id,
            engine,
            stage,
            results,
            stats,
            deadline,
        }
    }

    /// 运行工作循环
    ///
    /// # 返回值
    ///
    /// 本工作器处理的任务数
    pub async fn run(self, queue: QueueConsumer) -> usize {
        let mut handled = 0;
        loop {
            let task = match queue.get().await {
                Some(WorkItem::Task(task)) => task,
                Some(WorkItem::End) => break,
                None => {
                    debug!("Worker {} stopping: queue closed", self.id);
                    break;
                }
            };
            handled += 1;

            match self.attempt(&task).await {
                Attempt::Done(outcome) => self.stats.record(outcome),
                Attempt::Output(output) => {
                    if self.results.send(output).await.is_err() {
                        debug!("Worker {} stopping: result sink closed", self.id);
                        break;
                    }
                }
            }
        }
        trace!("Worker {} finished after {} tasks", self.id, handled);
        handled
    }

    #[instrument(level = "trace", skip(self, task), fields(worker = self.id, url = %task.url))]
    async fn attempt(&self, task: &UrlTask) -> Attempt<S::Output> {
        match tokio::time::timeout(self.deadline, self.fetch_and_process(task)).await {
            Err(_) => {
                trace!("Attempt exceeded {:?}", self.deadline);
                Attempt::Done(Outcome::Failed(FailureKind::WrapperTimeout))
            }
            Ok(Err(failure)) => {
                trace!("Fetch failed: {}", failure);
                Attempt::Done(Outcome::Failed(failure.kind))
            }
            Ok(Ok(Err(kind))) => Attempt::Done(Outcome::Rejected(kind)),
            Ok(Ok(Ok(output))) => Attempt::Output(output),
        }
    }

    async fn fetch_and_process(
        &self,
        task: &UrlTask,
    ) -> Result<Result<S::Output, RejectKind>, FetchFailure> {
        let page = self.engine.fetch(task).await?;
        Ok(self.stage.process(page).await)
    }
}
