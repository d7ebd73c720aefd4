// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// URL任务实体
///
/// 表示一次抓取工作单元。由URL源创建，只会被一个抓取工作器消费一次，
/// 在记录终态结果后即被丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlTask {
    /// 目标URL（原始请求地址）
    pub url: String,
}

impl UrlTask {
    /// 创建新的URL任务
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl fmt::Display for UrlTask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// 工作队列元素
///
/// 用带标签的枚举代替魔法空值：`End` 是发给单个工作器的结束信号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// 待抓取的任务
    Task(UrlTask),
    /// 流结束哨兵，每个工作器恰好收到一个
    End,
}

impl WorkItem {
    /// 是否为结束哨兵
    pub fn is_end(&self) -> bool {
        matches!(self, WorkItem::End)
    }
}

impl From<UrlTask> for WorkItem {
    fn from(task: UrlTask) -> Self {
        WorkItem::Task(task)
    }
}
