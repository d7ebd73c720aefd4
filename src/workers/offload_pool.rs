// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// CPU任务卸载池
///
/// 在 tokio 阻塞线程池上执行CPU密集型任务，用信号量限制同时运行的任务数，
/// 保证抓取事件循环线程不执行CPU工作。任务内部的 panic 被视为丢弃。
#[derive(Clone, Debug)]
pub struct OffloadPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl OffloadPool {
    /// 创建指定大小的卸载池
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// 默认大小：核数-2，至少为1
    pub fn default_size() -> usize {
        num_cpus::get().saturating_sub(2).max(1)
    }

    /// 池大小
    pub fn size(&self) -> usize {
        self.size
    }

    /// 当前空闲的执行槽位数
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// 提交任务并等待结果
    ///
    /// 任务返回 `None` 或发生 panic 时返回 `None`。
    pub async fn run<F, R>(&self, job: F) -> Option<R>
    where
        F: FnOnce() -> Option<R> + Send + 'static,
        R: Send + 'static,
    {
        let permit = self.permits.clone().acquire_owned().await.ok()?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                debug!("Offloaded job did not complete: {}", e);
                None
            }
        }
    }
}

impl Default for OffloadPool {
    fn default() -> Self {
        Self::new(Self::default_size())
    }
}
