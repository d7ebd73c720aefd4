// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_stats::{Outcome, RunStats};
use crate::infrastructure::storage::RecordWriter;
use crate::utils::errors::SinkError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// 结果写入端
///
/// 唯一持有输出文件的组件，在独立的阻塞线程上按到达顺序写入记录。
/// 每成功写入一条记录计一次 `saved`。所有发送端释放后刷新并关闭文件。
pub struct ResultSink<T> {
    sender: mpsc::Sender<T>,
    handle: JoinHandle<Result<u64, SinkError>>,
}

impl<T: Send + 'static> ResultSink<T> {
    /// 启动写入线程
    ///
    /// # 参数
    ///
    /// * `writer` - 记录写入器
    /// * `capacity` - 结果通道容量
    /// * `stats` - 运行统计
    pub fn spawn<W>(writer: W, capacity: usize, stats: Arc<RunStats>) -> Self
    where
        W: RecordWriter<T>,
    {
        let (sender, mut receiver) = mpsc::channel::<T>(capacity.max(1));

        let handle = tokio::task::spawn_blocking(move || {
            let mut writer = writer;
            while let Some(record) = receiver.blocking_recv() {
                if let Err(e) = writer.write_record(&record) {
                    error!("Result sink write failed: {}", e);
                    return Err(e);
                }
                stats.record(Outcome::Saved);
            }

            let written = writer.records_written();
            writer.finish()?;
            debug!("Result sink closed after {} records", written);
            Ok(written)
        });

        Self { sender, handle }
    }

    /// 获取发送端
    pub fn sender(&self) -> mpsc::Sender<T> {
        self.sender.clone()
    }

    /// 拆分为发送端与写入线程句柄
    ///
    /// 写入线程在所有发送端释放后结束。
    pub fn into_parts(self) -> (mpsc::Sender<T>, JoinHandle<Result<u64, SinkError>>) {
        (self.sender, self.handle)
    }
}
