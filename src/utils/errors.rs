// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 结果写入错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("输出IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("写入器已关闭")]
    Closed,
}

/// 队列错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    #[error("队列已关闭")]
    Closed,

    #[error("无效的队列容量: {0}")]
    InvalidCapacity(usize),
}

/// 运行协调器错误类型
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("结果写入失败: {0}")]
    Sink(#[from] SinkError),

    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),

    #[error("非法状态转换: {from} -> {to}")]
    InvalidState { from: String, to: String },

    #[error("任务执行失败: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<config::ConfigError> for HarvestError {
    fn from(e: config::ConfigError) -> Self {
        HarvestError::Config(e.to_string())
    }
}
