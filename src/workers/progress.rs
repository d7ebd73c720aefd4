// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_stats::RunStats;
use crate::queue::work_queue::QueueProducer;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// 进度报告器
///
/// 后台任务，周期性地把已完成数量、保存与失败计数以及队列深度
/// 刷新到进度条，同时更新队列深度指标。安静模式下进度条隐藏，
/// 指标照常更新。
pub struct ProgressReporter {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// 启动进度报告
    ///
    /// # 参数
    ///
    /// * `stats` - 运行统计
    /// * `queue` - 用于读取队列深度的生产端
    /// * `total` - 已知的任务总数（来自 `limit`），未知时显示为旋转指示器
    /// * `quiet` - 是否隐藏进度条
    pub fn spawn(
        stats: Arc<RunStats>,
        queue: QueueProducer,
        total: Option<u64>,
        quiet: bool,
    ) -> Self {
        let bar = build_bar(total, quiet);
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => refresh(&bar, &stats, &queue),
                    _ = &mut stopped => break,
                }
            }
            refresh(&bar, &stats, &queue);
            bar.finish();
        });

        Self {
            stop: Some(stop),
            handle,
        }
    }

    /// 停止报告并等待最后一次刷新
    pub async fn finish(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.handle.abort();
        }
    }
}

fn build_bar(total: Option<u64>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    match total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} done ({per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    }
}

fn refresh(bar: &ProgressBar, stats: &RunStats, queue: &QueueProducer) {
    let depth = queue.len();
    metrics::gauge!("harvest_queue_depth").set(depth as f64);

    bar.set_position(stats.completed());
    bar.set_message(format!(
        "saved {} | failed {} | queued {}",
        stats.saved(),
        stats.failed(),
        depth
    ));
}
