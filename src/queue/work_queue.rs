// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::WorkItem;
use crate::utils::errors::QueueError;
use kanal::{bounded_async, AsyncReceiver, AsyncSender};

/// 有界工作队列
///
/// 多生产者多消费者的有界FIFO。队列满时 `put` 挂起，队列空时 `get` 挂起。
pub struct WorkQueue {
    producer: QueueProducer,
    consumer: QueueConsumer,
    capacity: usize,
}

/// 队列生产端
#[derive(Clone)]
pub struct QueueProducer {
    sender: AsyncSender<WorkItem>,
}

/// 队列消费端
#[derive(Clone)]
pub struct QueueConsumer {
    receiver: AsyncReceiver<WorkItem>,
}

impl WorkQueue {
    /// 创建有界队列
    ///
    /// # 参数
    ///
    /// * `capacity` - 队列容量，必须大于0
    pub fn bounded(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity(capacity));
        }
        let (sender, receiver) = bounded_async(capacity);
        Ok(Self {
            producer: QueueProducer { sender },
            consumer: QueueConsumer { receiver },
            capacity,
        })
    }

    /// 按工作器数量创建默认容量（2倍工作器数）的队列
    pub fn for_workers(workers: usize) -> Result<Self, QueueError> {
        Self::bounded(workers.saturating_mul(2).max(1))
    }

    /// 队列容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 获取生产端句柄
    pub fn producer(&self) -> QueueProducer {
        self.producer.clone()
    }

    /// 获取消费端句柄
    pub fn consumer(&self) -> QueueConsumer {
        self.consumer.clone()
    }

    /// 拆分为生产端和消费端
    ///
    /// 所有生产端句柄释放后，消费端取完剩余元素即得到 `None`。
    pub fn split(self) -> (QueueProducer, QueueConsumer) {
        (self.producer, self.consumer)
    }

    /// 入队，队列满时挂起
    pub async fn put(&self, item: WorkItem) -> Result<(), QueueError> {
        self.producer.put(item).await
    }

    /// 出队，队列空时挂起
    pub async fn get(&self) -> Option<WorkItem> {
        self.consumer.get().await
    }

    /// 当前元素数
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueProducer {
    /// 入队，队列满时挂起
    pub async fn put(&self, item: WorkItem) -> Result<(), QueueError> {
        self.sender.send(item).await.map_err(|_| QueueError::Closed)
    }

    /// 为每个工作器投入一个结束哨兵
    pub async fn close_for_end(&self, workers: usize) -> Result<(), QueueError> {
        for _ in 0..workers {
            self.put(WorkItem::End).await?;
        }
        Ok(())
    }

    /// 当前元素数
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueConsumer {
    /// 出队，队列空时挂起
    ///
    /// 所有生产端释放且队列取空后返回 `None`。
    pub async fn get(&self) -> Option<WorkItem> {
        self.receiver.recv().await.ok()
    }

    /// 当前元素数
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
